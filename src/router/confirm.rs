//! Pending confirmation and the data-store mutation boundary.
//!
//! The router only ever proposes a change. `confirm_pending_action` is the
//! single place a proposal reaches the store, after a human said yes.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::scope::{ResolvedScope, ScopeSource};
use crate::project::Project;
use crate::types::{FieldName, UpdateData};

/// A proposed mutation plus the records it would touch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingConfirmationAction {
    pub affected_projects: Vec<Project>,
    pub affected_project_ids: Vec<String>,
    pub mutation: UpdateData,
    pub fields_to_show: Vec<FieldName>,
    pub scope_source: ScopeSource,
}

impl PendingConfirmationAction {
    pub fn new(scope: ResolvedScope, mutation: UpdateData, fields_to_show: Vec<FieldName>) -> Self {
        let affected_project_ids = scope.projects.iter().map(|p| p.id.clone()).collect();
        Self {
            affected_projects: scope.projects,
            affected_project_ids,
            mutation,
            fields_to_show,
            scope_source: scope.source,
        }
    }

    /// Ids the mutation can apply to.
    ///
    /// A deadline push or removal skips records without a deadline; this
    /// never changes the scope shown to the user.
    pub fn applicable_ids(&self) -> Vec<String> {
        if !self.mutation.requires_deadline {
            return self.affected_project_ids.clone();
        }
        self.affected_projects
            .iter()
            .filter(|p| p.deadline.is_some())
            .map(|p| p.id.clone())
            .collect()
    }
}

/// Data-store collaborator that applies a confirmed mutation
#[async_trait]
pub trait MutationExecutor: Send + Sync {
    /// Apply `mutation` to `project_ids`; returns how many records changed
    async fn apply(&self, project_ids: &[String], mutation: &UpdateData) -> Result<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationOutcome {
    pub applied: usize,
    pub skipped: usize,
    pub scope_source: ScopeSource,
}

/// Forward a confirmed action to the store
pub async fn confirm_pending_action(
    action: &PendingConfirmationAction,
    executor: &dyn MutationExecutor,
) -> Result<ConfirmationOutcome> {
    let ids = action.applicable_ids();
    let skipped = action.affected_project_ids.len() - ids.len();
    let applied = if ids.is_empty() {
        0
    } else {
        executor.apply(&ids, &action.mutation).await?
    };

    info!(
        applied,
        skipped,
        scope_source = ?action.scope_source,
        "Pending action confirmed"
    );
    Ok(ConfirmationOutcome {
        applied,
        skipped,
        scope_source: action.scope_source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeadlineShift, ParsedFilters};
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl MutationExecutor for RecordingExecutor {
        async fn apply(&self, project_ids: &[String], _mutation: &UpdateData) -> Result<usize> {
            self.calls.lock().unwrap().push(project_ids.to_vec());
            Ok(project_ids.len())
        }
    }

    fn scope() -> ResolvedScope {
        ResolvedScope {
            source: ScopeSource::LastListedIds,
            projects: vec![
                Project::new("1", "Aube").with_deadline(NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()),
                Project::new("2", "Nuit Blanche"),
            ],
            filters: ParsedFilters::default(),
            message: String::new(),
        }
    }

    #[tokio::test]
    async fn test_confirm_forwards_ids() {
        let action = PendingConfirmationAction::new(
            scope(),
            UpdateData {
                new_progress: Some(80),
                ..Default::default()
            },
            vec![FieldName::Progress],
        );
        let executor = RecordingExecutor::default();
        let outcome = confirm_pending_action(&action, &executor).await.unwrap();
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.scope_source, ScopeSource::LastListedIds);
        assert_eq!(executor.calls.lock().unwrap()[0], vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_deadline_qualifier_skips_records_without_deadline() {
        let action = PendingConfirmationAction::new(
            scope(),
            UpdateData {
                push_deadline_by: Some(DeadlineShift {
                    months: Some(1),
                    ..Default::default()
                }),
                requires_deadline: true,
                ..Default::default()
            },
            vec![FieldName::Deadline],
        );
        // Scope still shows both records
        assert_eq!(action.affected_project_ids, vec!["1", "2"]);

        let executor = RecordingExecutor::default();
        let outcome = confirm_pending_action(&action, &executor).await.unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_scope_source_serializes_verbatim() {
        let action = PendingConfirmationAction::new(scope(), UpdateData::default(), vec![]);
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["scopeSource"], "LastListedIds");
        assert_eq!(value["affectedProjectIds"], serde_json::json!(["1", "2"]));
    }
}
