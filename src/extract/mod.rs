//! Field extractors.
//!
//! Each extractor owns its compiled patterns and reads an [`ExtractInput`]:
//! the folded analysis text plus the caller's collaborator/style lists.
//! Extractors never fail; a pattern that does not match yields nothing and
//! later fallbacks take over.

pub mod create;
pub mod deadline;
pub mod filters;
pub mod metadata;
pub mod progress;
pub mod transition;

use std::ops::Range;

use chrono::NaiveDate;

use crate::lexicon::tables::{canonical_style, VALUE_STOP_WORDS};
use crate::normalize::{normalize_text, NormalizedQuery};

pub use create::CreateExtractor;
pub use deadline::{DateResolver, DeadlineExtraction, DeadlineExtractor};
pub use filters::{FilterExtraction, FilterExtractor};
pub use metadata::{MetadataExtraction, MetadataExtractor, NoteExtraction};
pub use progress::{ProgressExtraction, ProgressExtractor};
pub use transition::{StatusTarget, Transition, TransitionExtractor};

/// Minimum Jaro-Winkler score for a fuzzy collaborator/style match
pub const FUZZY_NAME_THRESHOLD: f64 = 0.9;

/// Maximum words captured for a free-text value
const MAX_VALUE_WORDS: usize = 4;

/// Shared read-only view handed to every extractor
pub struct ExtractInput<'a> {
    pub query: &'a NormalizedQuery,
    /// Folded text under analysis (a note body is cut off)
    pub text: &'a str,
    pub available_collabs: &'a [String],
    pub available_styles: &'a [String],
    pub today: NaiveDate,
}

impl<'a> ExtractInput<'a> {
    /// Original spelling of a folded span
    pub fn display(&self, range: Range<usize>) -> String {
        self.query.display_slice(range).to_string()
    }
}

/// Last word before `pos` in `text`
pub(crate) fn preceding_word(text: &str, pos: usize) -> Option<&str> {
    text.get(..pos)?
        .trim_end()
        .rsplit(' ')
        .next()
        .filter(|w| !w.is_empty())
}

/// First word at or after `pos` in `text`
pub(crate) fn following_word(text: &str, pos: usize) -> Option<&str> {
    text.get(pos..)?
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '\'')
        .next()
        .filter(|w| !w.is_empty())
}

fn is_stop_word(word: &str) -> bool {
    VALUE_STOP_WORDS.contains(&word)
}

/// Free-text value starting at `start`: words up to a stop word, punctuation
/// or `MAX_VALUE_WORDS`. Returns the folded byte range.
pub(crate) fn take_value(text: &str, start: usize) -> Option<Range<usize>> {
    let rest = text.get(start..)?;
    let mut value_start = None;
    let mut value_end = start;
    let mut words = 0;

    let mut offset = 0;
    for piece in rest.split(' ') {
        let piece_start = start + offset;
        offset += piece.len() + 1;
        if piece.is_empty() {
            continue;
        }
        if piece.starts_with(|c: char| ",;:.!?()\"".contains(c)) {
            break;
        }
        let word = piece.trim_end_matches(|c: char| ",;:.!?()\"".contains(c));
        if is_stop_word(word) {
            break;
        }
        value_start.get_or_insert(piece_start);
        value_end = piece_start + word.len();
        words += 1;
        if word.len() != piece.len() || words == MAX_VALUE_WORDS {
            break;
        }
    }

    value_start.map(|s| s..value_end).filter(|r| !r.is_empty())
}

/// Resolve a user-typed name against an available list.
///
/// Folded equality, then containment in either direction, then the best
/// Jaro-Winkler score above [`FUZZY_NAME_THRESHOLD`].
pub fn resolve_available(candidate: &str, available: &[String]) -> Option<String> {
    let folded = normalize_text(candidate);
    if folded.is_empty() {
        return None;
    }

    let folded_available: Vec<(String, &String)> = available
        .iter()
        .map(|name| (normalize_text(name), name))
        .filter(|(f, _)| !f.is_empty())
        .collect();

    if let Some((_, name)) = folded_available.iter().find(|(f, _)| *f == folded) {
        return Some((*name).clone());
    }

    if let Some((_, name)) = folded_available
        .iter()
        .find(|(f, _)| f.contains(folded.as_str()) || folded.contains(f.as_str()))
    {
        return Some((*name).clone());
    }

    folded_available
        .iter()
        .map(|(f, name)| (strsim::jaro_winkler(&folded, f), *name))
        .filter(|(score, _)| *score >= FUZZY_NAME_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, name)| name.clone())
}

/// Collaborator value: available list first, literal text otherwise
pub fn resolve_collab(literal: &str, available: &[String]) -> String {
    resolve_available(literal, available).unwrap_or_else(|| literal.to_string())
}

/// Style value: available list, then canonical style names, then literal
pub fn resolve_style(literal: &str, available: &[String]) -> String {
    if let Some(name) = resolve_available(literal, available) {
        return name;
    }
    canonical_style(&normalize_text(literal))
        .map(str::to_string)
        .unwrap_or_else(|| literal.to_string())
}

/// Value of a percentage or bare number, capped at 100
pub(crate) fn percent_value(raw: &str) -> Option<u8> {
    if raw == "zero" {
        return Some(0);
    }
    raw.parse::<u32>().ok().map(|n| n.min(100) as u8)
}
