//! Status Inference
//!
//! "passe les en terminé" right after "liste les projets en cours" means
//! "the ones in progress". When a follow-up update carries a new status but
//! no status filter, the filter is taken from the previous turn's filters,
//! else from the most recent user messages.

use regex::Regex;
use tracing::debug;

use crate::error::ParseError;
use crate::lexicon::tables::{DEMONSTRATIVES, SCOPE_PRONOUNS, UPDATE_VERBS};
use crate::lexicon::{build_alternation, Lexicon, ProjectStatus};
use crate::normalize::normalize_text;
use crate::types::{HistoryMessage, ParsedFilters, Role};

/// Where an inferred status came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceSource {
    LastFilters,
    /// Index into the scanned user messages, 0 = most recent
    History(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInference {
    pub status: ProjectStatus,
    pub source: InferenceSource,
}

pub struct StatusInferenceEngine {
    follow_up: Regex,
    scan_depth: usize,
}

impl StatusInferenceEngine {
    pub fn new(scan_depth: usize) -> Result<Self, ParseError> {
        let statuses: Vec<String> = ProjectStatus::ALL
            .iter()
            .map(|s| s.pattern_source())
            .collect();
        let follow_up = format!(
            r"\b{}\b[\s-]+(?:(?:{}|{})\s+)+(?:(?:tous|toutes|all)\s+)?(?:a|au|en|comme|to|as|into)\s+(?:{})",
            build_alternation(UPDATE_VERBS),
            build_alternation(SCOPE_PRONOUNS),
            build_alternation(DEMONSTRATIVES),
            statuses.join("|"),
        );
        Ok(Self {
            follow_up: Regex::new(&follow_up)?,
            scan_depth,
        })
    }

    pub fn is_follow_up(&self, text: &str) -> bool {
        self.follow_up.is_match(text)
    }

    /// Status for a follow-up update, if one can be inferred
    pub fn infer(
        &self,
        lexicon: &Lexicon,
        text: &str,
        filters: &ParsedFilters,
        new_status: Option<ProjectStatus>,
        last_filters: Option<&ParsedFilters>,
        history: &[HistoryMessage],
    ) -> Option<StatusInference> {
        if filters.status.is_some() || new_status.is_none() || !self.is_follow_up(text) {
            return None;
        }

        if let Some(status) = last_filters.and_then(|f| f.status) {
            debug!(status = %status, "Status inferred from previous filters");
            return Some(StatusInference {
                status,
                source: InferenceSource::LastFilters,
            });
        }

        let inferred = history
            .iter()
            .rev()
            .filter(|m| m.role == Role::User)
            .take(self.scan_depth)
            .enumerate()
            .find_map(|(idx, message)| {
                lexicon
                    .status
                    .first(&normalize_text(&message.content))
                    .map(|m| StatusInference {
                        status: m.status,
                        source: InferenceSource::History(idx),
                    })
            });

        if let Some(found) = &inferred {
            debug!(status = %found.status, source = ?found.source, "Status inferred from history");
        }
        inferred
    }
}
