//! Session memory for conversations.
//!
//! This module provides:
//! - An in-process [`SessionStore`] holding each session's messages and state
//! - Formatting of session state and history for LLM prompts
//!
//! Session state carries values agents hand to each other through their
//! output keys (`email`, `current_skills_development_needs`, `chosen_training`).
//! The store keeps at most a fixed number of sessions and evicts the least
//! recently used one when full.

use crate::types::{AgentContext, Message};
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use utoipa::ToSchema;

/// Default number of recent messages to include in context.
pub const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Default number of sessions kept in memory.
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

/// State key under which the employee email is kept.
pub const EMAIL_STATE_KEY: &str = "email";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub messages: Vec<Message>,
    #[schema(value_type = Object)]
    pub state: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: None,
            messages: Vec::new(),
            state: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// In-memory session store shared by all request handlers.
pub struct SessionStore {
    sessions: Mutex<LruCache<String, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding at most `capacity` sessions (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Build an agent context for a session.
    ///
    /// Unknown or missing ids start from an empty context; the session itself
    /// is stored by [`SessionStore::record_exchange`]. A request email
    /// overrides the one remembered for the session.
    pub fn context_for(&self, session_id: Option<&str>, email: Option<String>) -> AgentContext {
        let id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let email = email.filter(|e| !e.trim().is_empty());

        let mut sessions = self.sessions.lock();
        match sessions.get(&id) {
            Some(session) => AgentContext {
                email: email.or_else(|| session.email.clone()),
                conversation_history: session.messages.clone(),
                state: session.state.clone(),
                session_id: id,
            },
            None => AgentContext {
                email,
                ..AgentContext::new(id)
            },
        }
    }

    /// Persist one exchange into the session.
    ///
    /// Only state keys the turn changed relative to `initial_state` (the state
    /// handed out by [`SessionStore::context_for`]) are written, so concurrent
    /// turns on one session keep each other's output keys.
    pub fn record_exchange(
        &self,
        context: &AgentContext,
        initial_state: &HashMap<String, Value>,
        user: Message,
        reply: Message,
    ) {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_or_insert_mut(context.session_id.clone(), || {
            Session::new(context.session_id.clone())
        });

        session.messages.push(user);
        session.messages.push(reply);
        for (key, value) in &context.state {
            if initial_state.get(key) != Some(value) {
                session.state.insert(key.clone(), value.clone());
            }
        }
        for key in initial_state.keys() {
            if !context.state.contains_key(key) {
                session.state.remove(key);
            }
        }
        if context.email.is_some() {
            session.email = context.email.clone();
        }
        session.updated_at = Utc::now();
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.lock().peek(session_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.sessions.lock().cap().get()
    }
}

/// Formats session state for inclusion in a system prompt.
///
/// Keys are sorted. String values are inserted verbatim, others as JSON.
pub fn format_state_for_prompt(state: &HashMap<String, Value>) -> String {
    if state.is_empty() {
        return String::new();
    }

    let mut keys: Vec<&String> = state.keys().collect();
    keys.sort();

    let entries: Vec<String> = keys
        .into_iter()
        .map(|key| {
            let value = match &state[key] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("- {}: {}", key, value)
        })
        .collect();

    format!("Session state:\n{}", entries.join("\n"))
}

/// The most recent `window` messages, oldest first.
pub fn recent_history(history: &[Message], window: usize) -> &[Message] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}
