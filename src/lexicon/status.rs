//! Canonical project statuses and their synonym patterns.
//!
//! Every status is matched through a word-bounded alternation built from the
//! synonym table, except `GhostProduction`: its synonyms ("ghost", "gost") are
//! short enough to collide with unrelated words, so it uses a hand-written
//! boundary pattern.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tables::STATUS_SYNONYMS;
use super::build_alternation;
use crate::error::ParseError;
use crate::types::Lang;

/// The six canonical project statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    EnCours,
    Termine,
    Annule,
    AVenir,
    EnAttente,
    GhostProduction,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 6] = [
        ProjectStatus::EnCours,
        ProjectStatus::Termine,
        ProjectStatus::Annule,
        ProjectStatus::AVenir,
        ProjectStatus::EnAttente,
        ProjectStatus::GhostProduction,
    ];

    /// Wire name (matches the serde representation)
    pub fn code(&self) -> &'static str {
        match self {
            Self::EnCours => "EN_COURS",
            Self::Termine => "TERMINE",
            Self::Annule => "ANNULE",
            Self::AVenir => "A_VENIR",
            Self::EnAttente => "EN_ATTENTE",
            Self::GhostProduction => "GHOST_PRODUCTION",
        }
    }

    pub fn label(&self, lang: Lang) -> &'static str {
        match (self, lang) {
            (Self::EnCours, Lang::Fr) => "en cours",
            (Self::Termine, Lang::Fr) => "terminé",
            (Self::Annule, Lang::Fr) => "annulé",
            (Self::AVenir, Lang::Fr) => "à venir",
            (Self::EnAttente, Lang::Fr) => "en attente",
            (Self::GhostProduction, Lang::Fr) => "ghost production",
            (Self::EnCours, Lang::En) => "in progress",
            (Self::Termine, Lang::En) => "done",
            (Self::Annule, Lang::En) => "cancelled",
            (Self::AVenir, Lang::En) => "upcoming",
            (Self::EnAttente, Lang::En) => "on hold",
            (Self::GhostProduction, Lang::En) => "ghost production",
        }
    }

    /// Synonyms (folded form) that map to this status
    pub fn synonyms(&self) -> Vec<&'static str> {
        STATUS_SYNONYMS
            .iter()
            .filter(|(_, status)| status == self)
            .map(|(word, _)| *word)
            .collect()
    }

    /// Regex source for a single mention of this status (no capture groups)
    pub fn pattern_source(&self) -> String {
        match self {
            Self::GhostProduction => r"\b(?:ghost|gost)(?:[\s-]?prod(?:uction)?s?)?\b".to_string(),
            other => format!(r"\b{}\b", build_alternation(&other.synonyms())),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error type for parsing ProjectStatus
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown project status '{0}'")]
pub struct ParseStatusError(String);

impl FromStr for ProjectStatus {
    type Err = ParseStatusError;

    /// Accepts wire codes and any folded synonym
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded = crate::normalize::normalize_text(s);
        if let Some(status) = ProjectStatus::ALL
            .iter()
            .find(|status| status.code().eq_ignore_ascii_case(s.trim()))
        {
            return Ok(*status);
        }
        STATUS_SYNONYMS
            .iter()
            .find(|(word, _)| *word == folded)
            .map(|(_, status)| *status)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// A status found in folded text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMention {
    pub status: ProjectStatus,
    pub start: usize,
    pub end: usize,
}

/// Compiled single-status patterns
pub struct StatusMatcher {
    patterns: Vec<(ProjectStatus, Regex)>,
    anchored: Vec<(ProjectStatus, Regex)>,
}

impl StatusMatcher {
    pub fn new() -> Result<Self, ParseError> {
        let mut patterns = Vec::with_capacity(ProjectStatus::ALL.len());
        let mut anchored = Vec::with_capacity(ProjectStatus::ALL.len());
        for status in ProjectStatus::ALL {
            let source = status.pattern_source();
            patterns.push((status, Regex::new(&source)?));
            anchored.push((status, Regex::new(&format!("^(?:{})$", source))?));
        }
        Ok(Self { patterns, anchored })
    }

    /// All non-overlapping mentions ordered by position; on overlap the longest wins
    pub fn mentions(&self, text: &str) -> Vec<StatusMention> {
        let mut found: Vec<StatusMention> = self
            .patterns
            .iter()
            .flat_map(|(status, re)| {
                re.find_iter(text).map(move |m| StatusMention {
                    status: *status,
                    start: m.start(),
                    end: m.end(),
                })
            })
            .collect();

        found.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then((b.end - b.start).cmp(&(a.end - a.start)))
        });

        let mut kept: Vec<StatusMention> = Vec::new();
        for mention in found {
            if kept.last().is_some_and(|last| mention.start < last.end) {
                continue;
            }
            kept.push(mention);
        }
        kept
    }

    pub fn first(&self, text: &str) -> Option<StatusMention> {
        self.mentions(text).into_iter().next()
    }

    /// True when `fragment` is, in full, a mention of `status`
    pub fn matches_exactly(&self, status: ProjectStatus, fragment: &str) -> bool {
        self.anchored
            .iter()
            .find(|(s, _)| *s == status)
            .is_some_and(|(_, re)| re.is_match(fragment.trim()))
    }

    pub fn matches_exactly_any(&self, fragment: &str) -> bool {
        self.anchored
            .iter()
            .any(|(_, re)| re.is_match(fragment.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_synonym_maps_to_a_canonical_status() {
        for (word, status) in STATUS_SYNONYMS {
            assert!(ProjectStatus::ALL.contains(status), "{word}");
            assert_eq!(word.parse::<ProjectStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_every_status_has_synonyms() {
        for status in ProjectStatus::ALL {
            assert!(!status.synonyms().is_empty(), "{status}");
        }
    }

    #[test]
    fn test_mentions_prefer_longest_overlap() {
        let matcher = StatusMatcher::new().unwrap();
        let mentions = matcher.mentions("liste les ghost prod et les projets en cours");
        let statuses: Vec<_> = mentions.iter().map(|m| m.status).collect();
        assert_eq!(
            statuses,
            vec![ProjectStatus::GhostProduction, ProjectStatus::EnCours]
        );
        assert_eq!(
            &"liste les ghost prod"[mentions[0].start..mentions[0].end],
            "ghost prod"
        );
    }

    #[test]
    fn test_ghost_pattern_needs_word_boundary() {
        let matcher = StatusMatcher::new().unwrap();
        assert!(matcher.mentions("ghostwriter sessions").is_empty());
        assert!(matcher.matches_exactly(ProjectStatus::GhostProduction, "gost prod"));
    }

    #[test]
    fn test_from_str_accepts_codes_and_labels() {
        assert_eq!(
            "GHOST_PRODUCTION".parse::<ProjectStatus>().unwrap(),
            ProjectStatus::GhostProduction
        );
        assert_eq!("Terminé".parse::<ProjectStatus>().unwrap(), ProjectStatus::Termine);
        let err = "banane".parse::<ProjectStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown project status 'banane'");
    }
}
