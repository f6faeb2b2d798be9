//! Status-Transition Extractor
//!
//! "passe les projets en cours en annulé" carries two statuses: the first
//! qualifies records, the second is the target. Every ordered pair of
//! distinct statuses gets one rule per phrasing:
//!
//! ```text
//! EnChain  verb [les] [projets] (A) [en|to] (B)
//! FromTo   verb [les] [projets] de (A) à (B)
//! ```
//!
//! A candidate is accepted only when both captures re-match their own
//! status pattern, neither capture contains "projet"/"project", and a
//! GHOST_PRODUCTION capture literally contains "ghost" or "gost". The
//! longest accepted match wins; equal lengths keep rule order.

use std::ops::Range;

use regex::Regex;
use tracing::debug;

use super::preceding_word;
use crate::error::ParseError;
use crate::lexicon::tables::{PROJECT_NOUNS, TARGET_MARKERS, UPDATE_VERBS};
use crate::lexicon::{build_alternation, Lexicon, ProjectStatus, StatusMatcher, StatusMention};

/// Phrasing a transition rule recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionForm {
    /// "A en B"
    EnChain,
    /// "de A à B"
    FromTo,
}

/// One tagged rule: a pair of statuses, a phrasing and its regex
pub struct TransitionRule {
    pub from: ProjectStatus,
    pub to: ProjectStatus,
    pub form: TransitionForm,
    regex: Regex,
}

impl TransitionRule {
    fn candidate(&self, text: &str) -> Option<Candidate> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;
        let from = caps.name("from")?;
        let to = caps.name("to")?;
        Some(Candidate {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
            span: whole.range(),
        })
    }
}

struct Candidate {
    from: String,
    to: String,
    span: Range<usize>,
}

/// A detected "A → B" transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: ProjectStatus,
    pub to: ProjectStatus,
    pub form: TransitionForm,
    pub span: Range<usize>,
}

/// What the extractor found for the new status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusTarget {
    Transition(Transition),
    /// Single-verb fallback: only `newStatus`
    Single(StatusMention),
}

impl StatusTarget {
    pub fn new_status(&self) -> ProjectStatus {
        match self {
            StatusTarget::Transition(t) => t.to,
            StatusTarget::Single(m) => m.status,
        }
    }

    pub fn from_status(&self) -> Option<ProjectStatus> {
        match self {
            StatusTarget::Transition(t) => Some(t.from),
            StatusTarget::Single(_) => None,
        }
    }
}

pub struct TransitionExtractor {
    rules: Vec<TransitionRule>,
}

fn ghost_guard(status: ProjectStatus, capture: &str) -> bool {
    status != ProjectStatus::GhostProduction
        || capture.contains("ghost")
        || capture.contains("gost")
}

fn mentions_project(capture: &str) -> bool {
    capture.contains("projet") || capture.contains("project")
}

impl TransitionExtractor {
    pub fn new() -> Result<Self, ParseError> {
        let verbs = build_alternation(UPDATE_VERBS);
        let lead = format!(
            r"\b{verbs}\b(?:[\s-]+(?:tous les|toutes les|all the|les|mes|nos|des|the|all|my))?(?:\s+(?:projets?|projects?|prods?))?\s+"
        );

        let mut rules = Vec::new();
        for from in ProjectStatus::ALL {
            for to in ProjectStatus::ALL {
                if from == to {
                    continue;
                }
                let a = from.pattern_source();
                let b = to.pattern_source();

                let en_chain = format!(
                    r"{lead}(?:(?:en|au statut|qui sont|in|with status)\s+)?(?P<from>{a})\s+(?:(?:en|to|into|vers|a|as)\s+)?(?P<to>{b})"
                );
                let from_to = format!(
                    r"{lead}(?:de|du|from)\s+(?P<from>{a})\s+(?:a|au|to|en|vers)\s+(?P<to>{b})"
                );

                rules.push(TransitionRule {
                    from,
                    to,
                    form: TransitionForm::EnChain,
                    regex: Regex::new(&en_chain)?,
                });
                rules.push(TransitionRule {
                    from,
                    to,
                    form: TransitionForm::FromTo,
                    regex: Regex::new(&from_to)?,
                });
            }
        }

        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    /// Best accepted "A → B" transition in `text`
    pub fn find_transition(&self, matcher: &StatusMatcher, text: &str) -> Option<Transition> {
        let mut best: Option<Transition> = None;

        for rule in &self.rules {
            let Some(candidate) = rule.candidate(text) else {
                continue;
            };

            let accepted = matcher.matches_exactly(rule.from, &candidate.from)
                && matcher.matches_exactly(rule.to, &candidate.to)
                && !mentions_project(&candidate.from)
                && !mentions_project(&candidate.to)
                && ghost_guard(rule.from, &candidate.from)
                && ghost_guard(rule.to, &candidate.to);
            if !accepted {
                continue;
            }

            let len = candidate.span.len();
            if best.as_ref().map_or(true, |b| len > b.span.len()) {
                best = Some(Transition {
                    from: rule.from,
                    to: rule.to,
                    form: rule.form,
                    span: candidate.span,
                });
            }
        }

        if let Some(t) = &best {
            debug!(from = %t.from, to = %t.to, form = ?t.form, len = t.span.len(), "Status transition selected");
        }
        best
    }

    /// Transition, or the single-status fallback after the update verb
    pub fn extract(&self, lexicon: &Lexicon, text: &str) -> Option<StatusTarget> {
        if let Some(transition) = self.find_transition(&lexicon.status, text) {
            return Some(StatusTarget::Transition(transition));
        }

        let verb_end = lexicon.update_verb_end(text)?;
        let mention = lexicon
            .status
            .mentions(text)
            .into_iter()
            .filter(|m| m.start >= verb_end)
            .last()?;

        let before = preceding_word(text, mention.start);
        let marked = before.is_some_and(|w| TARGET_MARKERS.contains(&w));
        let en_form = text[mention.start..mention.end].starts_with("en ")
            && !before.is_some_and(|w| PROJECT_NOUNS.contains(&w));

        (marked || en_form).then_some(StatusTarget::Single(mention))
    }
}
