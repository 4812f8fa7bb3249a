//! Retrieval over company documentation.
//!
//! Company policies and general company information are indexed in a managed
//! semantic search data store (Vertex AI Search / Discovery Engine). Agents
//! ground their answers in the hits returned here.
//!
//! # Example
//!
//! ```ignore
//! use mentor::rag::{SemanticSearch, VertexSearchClient};
//!
//! let credentials = token_source_from_config(&config.google).await?;
//! let search = VertexSearchClient::from_config(&config, credentials);
//! let hits = search.search("external certification policy", 5).await?;
//! ```

pub mod search;

pub use search::{data_store_path, SearchHit, SemanticSearch, VertexSearchClient};
