//! Conversation Memory
//!
//! Per-user, TTL-bound record of the last listed result set, the last
//! filters and the last action. Every read checks expiry first; an expired
//! context reads as absent and is deleted lazily (on that read or by
//! `cleanup_expired`).

pub mod reference;
pub mod store;

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

pub use reference::{
    resolve_reference, ReferenceDetector, ReferenceError, ReferenceKind, ResolvedReference,
};
pub use store::{
    ActionType, Clock, ContextStore, ConversationContext, InMemoryContextStore, ManualClock,
    SystemClock,
};

use crate::types::ParsedFilters;

/// Result of reading a user's context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextLookup {
    Active(ConversationContext),
    /// Present but older than the TTL; callers treat it as absent
    Expired(ConversationContext),
    Missing,
}

impl ContextLookup {
    pub fn active(self) -> Option<ConversationContext> {
        match self {
            ContextLookup::Active(ctx) => Some(ctx),
            _ => None,
        }
    }
}

/// Field-by-field context update; `None` leaves the stored value alone
#[derive(Debug, Clone, Default)]
pub struct ContextUpdate {
    pub project_ids: Option<Vec<String>>,
    pub project_names: Option<Vec<String>>,
    pub project_count: Option<usize>,
    pub filters: Option<ParsedFilters>,
    pub action_type: Option<ActionType>,
}

#[derive(Clone)]
pub struct ConversationMemory {
    store: Arc<dyn ContextStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ConversationMemory {
    pub fn new(store: Arc<dyn ContextStore>, clock: Arc<dyn Clock>, ttl: std::time::Duration) -> Self {
        Self {
            store,
            clock,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(300)),
        }
    }

    /// In-memory store on the system clock
    pub fn in_memory(ttl: std::time::Duration) -> Self {
        Self::new(
            Arc::new(InMemoryContextStore::new()),
            Arc::new(SystemClock),
            ttl,
        )
    }

    pub fn lookup(&self, user_id: &str) -> ContextLookup {
        let Some(ctx) = self.store.get(user_id) else {
            return ContextLookup::Missing;
        };
        if ctx.is_expired(self.clock.now(), self.ttl) {
            debug!(user_id, last_action = %ctx.last_action_timestamp, "Conversation context expired");
            self.store.delete(user_id);
            return ContextLookup::Expired(ctx);
        }
        ContextLookup::Active(ctx)
    }

    /// Active context, or `None` when missing or expired
    pub fn get_context(&self, user_id: &str) -> Option<ConversationContext> {
        self.lookup(user_id).active()
    }

    /// Merge `update` into the user's context and stamp it with `now`.
    ///
    /// An expired context is replaced, not merged. Concurrent updates for
    /// the same user are last-write-wins.
    pub fn update_context(&self, user_id: &str, update: ContextUpdate) -> ConversationContext {
        let now = self.clock.now();
        let mut ctx = self
            .lookup(user_id)
            .active()
            .unwrap_or_else(|| ConversationContext::empty(now));

        if let Some(ids) = update.project_ids {
            ctx.last_project_count = update.project_count.unwrap_or(ids.len());
            ctx.last_project_ids = ids;
        } else if let Some(count) = update.project_count {
            ctx.last_project_count = count;
        }
        if let Some(names) = update.project_names {
            ctx.last_project_names = names;
        }
        if let Some(filters) = update.filters {
            let filters = filters.compact();
            ctx.last_status_filter = filters.status;
            ctx.last_filters = Some(filters);
        }
        if update.action_type.is_some() {
            ctx.last_action_type = update.action_type;
        }
        ctx.last_action_timestamp = now;

        self.store.set(user_id, ctx.clone());
        ctx
    }

    /// Record the working set produced by a LIST
    pub fn record_list(
        &self,
        user_id: &str,
        project_ids: Vec<String>,
        project_names: Vec<String>,
        filters: ParsedFilters,
    ) -> ConversationContext {
        self.update_context(
            user_id,
            ContextUpdate {
                project_ids: Some(project_ids),
                project_names: Some(project_names),
                project_count: None,
                filters: Some(filters),
                action_type: Some(ActionType::List),
            },
        )
    }

    pub fn clear(&self, user_id: &str) -> bool {
        self.store.delete(user_id)
    }

    /// Delete every expired context; returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        for user_id in self.store.keys() {
            let expired = self
                .store
                .get(&user_id)
                .is_some_and(|ctx| ctx.is_expired(now, self.ttl));
            if expired && self.store.delete(&user_id) {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "Expired conversation contexts removed");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::ProjectStatus;
    use chrono::{TimeZone, Utc};

    fn memory() -> (ConversationMemory, Arc<ManualClock>, Arc<InMemoryContextStore>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
        ));
        let store = Arc::new(InMemoryContextStore::new());
        let memory = ConversationMemory::new(
            store.clone(),
            clock.clone(),
            std::time::Duration::from_secs(300),
        );
        (memory, clock, store)
    }

    #[test]
    fn test_context_expires_after_ttl() {
        let (memory, clock, store) = memory();
        memory.record_list("u1", vec!["1".into()], vec!["Aube".into()], ParsedFilters::default());

        clock.advance(Duration::milliseconds(300_000));
        assert!(memory.get_context("u1").is_some());

        clock.advance(Duration::milliseconds(1_000));
        assert!(matches!(memory.lookup("u1"), ContextLookup::Expired(_)));
        // Deleted lazily by the read above
        assert!(store.is_empty());
        assert_eq!(memory.lookup("u1"), ContextLookup::Missing);
    }

    #[test]
    fn test_update_merges_field_by_field() {
        let (memory, _, _) = memory();
        let filters = ParsedFilters {
            status: Some(ProjectStatus::EnCours),
            ..Default::default()
        };
        memory.record_list("u1", vec!["1".into(), "2".into()], vec![], filters);
        let ctx = memory.update_context(
            "u1",
            ContextUpdate {
                action_type: Some(ActionType::Update),
                ..Default::default()
            },
        );
        assert_eq!(ctx.last_project_ids, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(ctx.last_project_count, 2);
        assert_eq!(ctx.last_status_filter, Some(ProjectStatus::EnCours));
        assert_eq!(ctx.last_action_type, Some(ActionType::Update));
    }

    #[test]
    fn test_cleanup_sweep() {
        let (memory, clock, _) = memory();
        memory.record_list("old", vec!["1".into()], vec![], ParsedFilters::default());
        clock.advance(Duration::seconds(200));
        memory.record_list("fresh", vec!["2".into()], vec![], ParsedFilters::default());
        clock.advance(Duration::seconds(150));

        assert_eq!(memory.cleanup_expired(), 1);
        assert!(memory.get_context("fresh").is_some());
        assert_eq!(memory.lookup("old"), ContextLookup::Missing);
    }
}
