//! Warehouse access.
//!
//! Employee profiles, training registrations and the project portfolio live
//! in a managed SQL warehouse (BigQuery). Tools talk to it through the
//! [`Warehouse`] trait so they can be exercised against a mock.
//!
//! # Tables
//!
//! All tables live in the configured dataset:
//! - `employee_profiles` - name, email, department, role, comma-joined skills
//! - `employee_trainings` - one row per registration, append-only
//! - `project_portfolio` - projects with their required skills

#![allow(missing_docs)]

pub mod bigquery;
pub mod traits;

pub use bigquery::BigQueryClient;
pub use traits::{
    table_ref, ParameterType, QueryParameter, Row, Warehouse, EMPLOYEE_PROFILES_TABLE,
    EMPLOYEE_TRAININGS_TABLE, PROJECT_PORTFOLIO_TABLE,
};

#[cfg(test)]
pub use traits::MockWarehouse;
