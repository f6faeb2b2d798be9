//! Input normalization and validation.
//!
//! Two views of a query are kept side by side:
//! - `display`: quotes stripped, whitespace collapsed, original casing and
//!   accents preserved. Display values (names, notes) are cut from here.
//! - `folded`: lowercase, diacritics removed, typographic apostrophes and
//!   quotes mapped to ASCII. Every pattern runs on this one.
//!
//! `offsets` maps each byte of `folded` back to the byte where its source
//! character starts in `display`, so a match on folded text can be lifted
//! back to the user's own spelling.

use std::ops::Range;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::ParserConfig;
use crate::error::ValidationError;
use crate::types::{HistoryMessage, ParsedFilters};

const QUOTE_CHARS: &[char] = &['"', '\'', '“', '”', '«', '»', '‘', '’', '„'];

/// Strip one leading and one trailing quote character, independently
pub fn strip_quotes(s: &str) -> &str {
    let trimmed = s.trim();
    let without_leading = match trimmed.chars().next() {
        Some(c) if QUOTE_CHARS.contains(&c) => &trimmed[c.len_utf8()..],
        _ => trimmed,
    };
    let without_trailing = match without_leading.chars().last() {
        Some(c) if QUOTE_CHARS.contains(&c) => {
            &without_leading[..without_leading.len() - c.len_utf8()]
        }
        _ => without_leading,
    };
    without_trailing.trim()
}

/// Collapse every whitespace run to a single space
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_char(c: char, out: &mut String) {
    for lower in c.to_lowercase() {
        for d in std::iter::once(lower).nfd() {
            if is_combining_mark(d) {
                continue;
            }
            out.push(match d {
                '’' | '‘' | 'ʼ' | '´' | '`' => '\'',
                '“' | '”' | '«' | '»' | '„' => '"',
                '–' | '—' | '‐' => '-',
                other => other,
            });
        }
    }
}

/// Fold text for matching: lowercase, no diacritics, ASCII punctuation,
/// single spaces. Idempotent.
pub fn normalize_text(s: &str) -> String {
    let mut folded = String::with_capacity(s.len());
    for c in s.chars() {
        fold_char(c, &mut folded);
    }
    collapse_whitespace(&folded)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `needle` occurs in `haystack` between word boundaries, the way
/// `\b<needle>\b` would match
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    let (Some(first), Some(last)) = (needle.chars().next(), needle.chars().next_back()) else {
        return false;
    };
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        before.is_some_and(is_word_char) != is_word_char(first)
            && after.is_some_and(is_word_char) != is_word_char(last)
    })
}

/// A query in its display and folded forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub display: String,
    pub folded: String,
    offsets: Vec<usize>,
}

impl NormalizedQuery {
    pub fn new(raw: &str) -> Self {
        let display = collapse_whitespace(strip_quotes(raw));
        let mut folded = String::with_capacity(display.len());
        let mut offsets = Vec::with_capacity(display.len());

        for (idx, c) in display.char_indices() {
            let before = folded.len();
            fold_char(c, &mut folded);
            offsets.extend(std::iter::repeat(idx).take(folded.len() - before));
        }

        Self {
            display,
            folded,
            offsets,
        }
    }

    /// Map a byte range of `folded` back to `display`
    pub fn display_range(&self, range: Range<usize>) -> Range<usize> {
        let start = self
            .offsets
            .get(range.start)
            .copied()
            .unwrap_or(self.display.len());
        let end = self
            .offsets
            .get(range.end)
            .copied()
            .unwrap_or(self.display.len());
        start..end.max(start)
    }

    /// Original spelling of a folded span, trimmed
    pub fn display_slice(&self, range: Range<usize>) -> &str {
        let mapped = self.display_range(range);
        self.display[mapped].trim()
    }

    /// Replace a folded span (typo correction); display text is untouched
    pub fn replace_folded(&mut self, range: Range<usize>, replacement: &str) {
        let anchor = self
            .offsets
            .get(range.start)
            .copied()
            .unwrap_or(self.display.len());
        self.folded.replace_range(range.clone(), replacement);
        self.offsets.splice(
            range,
            std::iter::repeat(anchor).take(replacement.len()),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

pub fn validate_query(query: &str, config: &ParserConfig) -> Result<(), ValidationError> {
    let len = query.chars().count();
    if len > config.max_query_len {
        return Err(ValidationError::TooLong {
            field: "query".into(),
            len,
            max: config.max_query_len,
        });
    }
    if strip_quotes(query).trim().is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    Ok(())
}

/// Validate a caller-supplied name list (`availableCollabs`, `availableStyles`)
pub fn validate_names(
    field: &str,
    names: &[String],
    config: &ParserConfig,
) -> Result<(), ValidationError> {
    if names.len() > config.max_list_items {
        return Err(ValidationError::TooManyItems {
            field: field.into(),
            len: names.len(),
            max: config.max_list_items,
        });
    }
    for (index, name) in names.iter().enumerate() {
        if name.chars().count() > config.max_item_len {
            return Err(ValidationError::InvalidItem {
                field: field.into(),
                index,
                reason: format!("longer than {} chars", config.max_item_len),
            });
        }
    }
    Ok(())
}

pub fn validate_history(
    history: &[HistoryMessage],
    config: &ParserConfig,
) -> Result<(), ValidationError> {
    if history.len() > config.max_history {
        return Err(ValidationError::TooManyItems {
            field: "conversationHistory".into(),
            len: history.len(),
            max: config.max_history,
        });
    }
    for (index, message) in history.iter().enumerate() {
        if message.content.chars().count() > config.max_query_len {
            return Err(ValidationError::InvalidItem {
                field: "conversationHistory".into(),
                index,
                reason: "message too long".into(),
            });
        }
    }
    Ok(())
}

pub fn validate_last_filters(
    filters: &ParsedFilters,
    config: &ParserConfig,
) -> Result<(), ValidationError> {
    for (field, value) in [
        ("lastFilters.collab", &filters.collab),
        ("lastFilters.style", &filters.style),
        ("lastFilters.label", &filters.label),
        ("lastFilters.labelFinal", &filters.label_final),
        ("lastFilters.name", &filters.name),
    ] {
        if let Some(v) = value {
            if v.chars().count() > config.max_item_len {
                return Err(ValidationError::TooLong {
                    field: field.into(),
                    len: v.chars().count(),
                    max: config.max_item_len,
                });
            }
        }
    }
    if let (Some(min), Some(max)) = (filters.min_progress, filters.max_progress) {
        if min > max {
            return Err(ValidationError::InvalidShape {
                field: "lastFilters".into(),
                reason: format!("minProgress {} above maxProgress {}", min, max),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_word_respects_boundaries() {
        assert!(contains_word("les projets trap en cours", "trap"));
        assert!(contains_word("trap", "trap"));
        assert!(contains_word("passe ete 85 en termine", "ete 85"));
        assert!(!contains_word("les projets trapu", "trap"));
        assert!(!contains_word("entrap", "trap"));
        assert!(contains_word("entrap, trap", "trap"));
        assert!(!contains_word("trap", ""));
    }

    #[test]
    fn test_fold_accents_and_apostrophes() {
        assert_eq!(
            normalize_text("Passe   l’avancement à 50%  "),
            "passe l'avancement a 50%"
        );
        assert_eq!(normalize_text("Terminés, ANNULÉ"), "termines, annule");
    }

    #[test]
    fn test_strip_quotes_independently() {
        assert_eq!(strip_quotes("\"liste les projets\""), "liste les projets");
        assert_eq!(strip_quotes("\"liste les projets"), "liste les projets");
        assert_eq!(strip_quotes("liste les projets'"), "liste les projets");
        assert_eq!(strip_quotes("'\"x\"'"), "\"x\"");
    }

    #[test]
    fn test_display_slice_recovers_original_spelling() {
        let nq = NormalizedQuery::new("  \"Crée le projet Éclipse Noire\" ");
        assert_eq!(nq.folded, "cree le projet eclipse noire");
        let start = nq.folded.find("eclipse").unwrap();
        assert_eq!(nq.display_slice(start..nq.folded.len()), "Éclipse Noire");
    }

    #[test]
    fn test_replace_folded_keeps_mapping() {
        let mut nq = NormalizedQuery::new("passe en termnié");
        let start = nq.folded.find("termnie").unwrap();
        nq.replace_folded(start..start + "termnie".len(), "termine");
        assert_eq!(nq.folded, "passe en termine");
        assert_eq!(nq.display_slice(0..5), "passe");
    }

    #[test]
    fn test_validate_query_limits() {
        let config = ParserConfig::default();
        assert!(validate_query("liste", &config).is_ok());
        assert_eq!(
            validate_query("  \"\" ", &config),
            Err(ValidationError::EmptyQuery)
        );
        let long = "a".repeat(config.max_query_len + 1);
        assert!(matches!(
            validate_query(&long, &config),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_names_limits() {
        let config = ParserConfig {
            max_list_items: 2,
            ..ParserConfig::default()
        };
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert!(matches!(
            validate_names("availableCollabs", &names, &config),
            Err(ValidationError::TooManyItems { len: 3, max: 2, .. })
        ));
    }
}
