//! Contextual reference detection.
//!
//! Three independent regex families, checked in priority order:
//!
//! ```text
//! pronoun       "met les à 80%", "change leur deadline"
//! demonstrative "modifie ceux-là", "passe ces projets en terminé"
//! implicit      "maintenant met à 80%", "et passe en terminé"
//! ```
//!
//! A query with none of these signals is never treated as a follow-up.

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use super::{ContextLookup, ConversationContext};
use crate::error::ParseError;
use crate::lexicon::tables::{DEMONSTRATIVES, IMPLICIT_MARKERS, PROJECT_NOUNS, UPDATE_VERBS};
use crate::lexicon::{build_alternation, word_regex};
use crate::messages;
use crate::types::{Lang, ParsedFilters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Pronoun,
    Demonstrative,
    Implicit,
}

/// Reference resolved against a live context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub kind: ReferenceKind,
    pub project_ids: Vec<String>,
    pub filters: Option<ParsedFilters>,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("No previous context to resolve a {0:?} reference")]
    MissingContext(ReferenceKind),

    #[error("Previous context expired before resolving a {0:?} reference")]
    ExpiredContext(ReferenceKind),
}

impl ReferenceError {
    pub fn user_message(&self, lang: Lang) -> String {
        match self {
            ReferenceError::MissingContext(_) => messages::missing_context(lang),
            ReferenceError::ExpiredContext(_) => messages::expired_context(lang),
        }
    }
}

pub struct ReferenceDetector {
    pronoun: Regex,
    possessive: Regex,
    demonstrative: Regex,
    implicit: Regex,
    update_verb: Regex,
    project_noun_next: Regex,
}

impl ReferenceDetector {
    pub fn new() -> Result<Self, ParseError> {
        let verbs = build_alternation(UPDATE_VERBS);
        Ok(Self {
            pronoun: Regex::new(&format!(
                r"\b{}[\s-]+(?:les|leur|leurs|eux|them|their)\b",
                verbs
            ))?,
            possessive: Regex::new(r"\b(?:leur|leurs|their)\b")?,
            demonstrative: word_regex(DEMONSTRATIVES)?,
            implicit: Regex::new(&format!(r"^{}\b", build_alternation(IMPLICIT_MARKERS)))?,
            update_verb: word_regex(UPDATE_VERBS)?,
            project_noun_next: Regex::new(&format!(r"^\s+{}\b", build_alternation(PROJECT_NOUNS)))?,
        })
    }

    /// Kind of back-reference in a folded query, if any
    pub fn detect(&self, text: &str) -> Option<ReferenceKind> {
        if self.has_pronoun(text) {
            Some(ReferenceKind::Pronoun)
        } else if self.demonstrative.is_match(text) {
            Some(ReferenceKind::Demonstrative)
        } else if self.implicit.is_match(text) && self.update_verb.is_match(text) {
            Some(ReferenceKind::Implicit)
        } else {
            None
        }
    }

    fn has_pronoun(&self, text: &str) -> bool {
        // "passe les projets en cours" names its scope
        let after_verb = self
            .pronoun
            .find_iter(text)
            .any(|m| !self.project_noun_next.is_match(&text[m.end()..]));
        after_verb
            || self
                .possessive
                .find_iter(text)
                .any(|m| !self.project_noun_next.is_match(&text[m.end()..]))
    }
}

/// Resolve a detected reference against the user's context
pub fn resolve_reference(
    kind: ReferenceKind,
    lookup: &ContextLookup,
    lang: Lang,
) -> Result<ResolvedReference, ReferenceError> {
    let context: &ConversationContext = match lookup {
        ContextLookup::Active(ctx) => ctx,
        ContextLookup::Expired(_) => return Err(ReferenceError::ExpiredContext(kind)),
        ContextLookup::Missing => return Err(ReferenceError::MissingContext(kind)),
    };
    if !context.has_working_set() && context.last_filters.as_ref().map_or(true, |f| f.is_empty()) {
        return Err(ReferenceError::MissingContext(kind));
    }

    let count = if context.has_working_set() {
        context.last_project_ids.len()
    } else {
        context.last_project_count
    };
    Ok(ResolvedReference {
        kind,
        project_ids: context.last_project_ids.clone(),
        filters: context.last_filters.clone(),
        message: messages::reference_confirmation(count, lang),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_text;
    use chrono::{TimeZone, Utc};

    fn detect(query: &str) -> Option<ReferenceKind> {
        ReferenceDetector::new()
            .unwrap()
            .detect(&normalize_text(query))
    }

    #[test]
    fn test_reference_kinds() {
        assert_eq!(detect("met les à 80%"), Some(ReferenceKind::Pronoun));
        assert_eq!(detect("change leur deadline au 15 mars"), Some(ReferenceKind::Pronoun));
        assert_eq!(detect("modifie ceux-là"), Some(ReferenceKind::Demonstrative));
        assert_eq!(detect("maintenant met à 80%"), Some(ReferenceKind::Implicit));
        assert_eq!(detect("et passe en terminé"), Some(ReferenceKind::Implicit));
    }

    #[test]
    fn test_no_reference() {
        assert_eq!(detect("liste les projets terminés"), None);
        assert_eq!(detect("passe les projets en cours en annulé"), None);
        assert_eq!(detect("et les projets annulés ?"), None);
    }

    #[test]
    fn test_resolution() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let mut ctx = ConversationContext::empty(now);
        ctx.last_project_ids = vec!["4".into(), "2".into()];

        let resolved =
            resolve_reference(ReferenceKind::Pronoun, &ContextLookup::Active(ctx.clone()), Lang::Fr)
                .unwrap();
        assert_eq!(resolved.project_ids, vec!["4".to_string(), "2".to_string()]);
        assert_eq!(resolved.message, "Appliquer aux 2 projets précédemment listés");

        assert_eq!(
            resolve_reference(ReferenceKind::Pronoun, &ContextLookup::Expired(ctx), Lang::Fr),
            Err(ReferenceError::ExpiredContext(ReferenceKind::Pronoun))
        );
        assert_eq!(
            resolve_reference(ReferenceKind::Implicit, &ContextLookup::Missing, Lang::Fr),
            Err(ReferenceError::MissingContext(ReferenceKind::Implicit))
        );
    }
}
