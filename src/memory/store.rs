//! Context storage and time source.
//!
//! `ContextStore` is the injectable key/value seam (an in-memory map by
//! default, a distributed cache in a larger deployment). `Clock` lets tests
//! move time forward without sleeping.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::lexicon::ProjectStatus;
use crate::types::{ParsedFilters, QueryType};

// ---------------------------------------------------------------------------
// ConversationContext
// ---------------------------------------------------------------------------

/// Last action a user performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    List,
    Count,
    Update,
    Create,
    Search,
}

impl From<QueryType> for ActionType {
    fn from(value: QueryType) -> Self {
        match value {
            QueryType::List => ActionType::List,
            QueryType::Count => ActionType::Count,
            QueryType::Update => ActionType::Update,
            QueryType::Create => ActionType::Create,
            QueryType::Search => ActionType::Search,
        }
    }
}

/// Per-user conversational state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    /// Display order of the last listing
    pub last_project_ids: Vec<String>,
    pub last_project_names: Vec<String>,
    pub last_project_count: usize,
    pub last_filters: Option<ParsedFilters>,
    pub last_action_type: Option<ActionType>,
    pub last_action_timestamp: DateTime<Utc>,
    pub last_status_filter: Option<ProjectStatus>,
}

impl ConversationContext {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            last_project_ids: Vec::new(),
            last_project_names: Vec::new(),
            last_project_count: 0,
            last_filters: None,
            last_action_type: None,
            last_action_timestamp: now,
            last_status_filter: None,
        }
    }

    /// Strictly older than `ttl` at `now`
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_action_timestamp > ttl
    }

    pub fn has_working_set(&self) -> bool {
        !self.last_project_ids.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ContextStore
// ---------------------------------------------------------------------------

/// Key/value store for conversation contexts, keyed by user id
pub trait ContextStore: Send + Sync {
    fn get(&self, user_id: &str) -> Option<ConversationContext>;
    fn set(&self, user_id: &str, context: ConversationContext);
    fn delete(&self, user_id: &str) -> bool;
    fn keys(&self) -> Vec<String>;
}

/// Process-local store.
///
/// Writes for the same user are last-write-wins; there is no ordering
/// between concurrent requests.
#[derive(Default)]
pub struct InMemoryContextStore {
    contexts: RwLock<HashMap<String, ConversationContext>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contexts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContextStore for InMemoryContextStore {
    fn get(&self, user_id: &str) -> Option<ConversationContext> {
        self.contexts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    fn set(&self, user_id: &str, context: ConversationContext) {
        self.contexts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id.to_string(), context);
    }

    fn delete(&self, user_id: &str) -> bool {
        self.contexts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id)
            .is_some()
    }

    fn keys(&self) -> Vec<String> {
        self.contexts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_store_roundtrip_and_delete() {
        let store = InMemoryContextStore::new();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let mut ctx = ConversationContext::empty(now);
        ctx.last_project_ids = vec!["1".into(), "2".into()];

        store.set("u1", ctx.clone());
        assert_eq!(store.get("u1"), Some(ctx));
        assert_eq!(store.keys(), vec!["u1".to_string()]);
        assert!(store.delete("u1"));
        assert!(!store.delete("u1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_expiry_is_strict() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let ctx = ConversationContext::empty(t0);
        let ttl = Duration::seconds(300);
        assert!(!ctx.is_expired(t0 + Duration::milliseconds(300_000), ttl));
        assert!(ctx.is_expired(t0 + Duration::milliseconds(301_000), ttl));
    }

    #[test]
    fn test_manual_clock_advances() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let clock = ManualClock::new(t0);
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), t0 + Duration::minutes(5));
    }
}
