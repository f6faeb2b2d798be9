//! Edit-distance pre-pass over lexicon vocabulary.
//!
//! Off by default (`ParserConfig::typo_tolerance`). Each folded word of four
//! letters or more that is not itself vocabulary is replaced by the single
//! closest vocabulary word within `max_distance`. Ties leave the word alone.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::debug;

use super::tables::*;
use crate::error::ParseError;
use crate::normalize::NormalizedQuery;

const MIN_WORD_LEN: usize = 4;

/// A single applied correction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub from: String,
    pub to: &'static str,
}

pub struct TypoCorrector {
    vocabulary: BTreeSet<&'static str>,
    word: Regex,
}

impl TypoCorrector {
    pub fn new() -> Result<Self, ParseError> {
        let phrases = UPDATE_VERBS
            .iter()
            .chain(LIST_VERBS)
            .chain(COUNT_WORDS)
            .chain(SEARCH_VERBS)
            .chain(CREATE_VERBS)
            .chain(PROJECT_NOUNS)
            .chain(DEADLINE_NOUNS)
            .chain(PROGRESS_NOUNS)
            .copied()
            .chain(keys(STATUS_SYNONYMS))
            .chain(keys(FIELD_ALIASES))
            .chain(TIME_UNITS.iter().map(|(w, _, _)| *w))
            .chain(keys(MONTHS))
            .chain(keys(WEEKDAYS));

        // Multi-word phrases contribute their words individually
        let vocabulary = phrases
            .flat_map(|p| p.split([' ', '-', '\'']))
            .filter(|w| w.len() >= MIN_WORD_LEN)
            .collect();

        Ok(Self {
            vocabulary,
            word: Regex::new(r"\b\p{L}+\b")?,
        })
    }

    pub fn is_known(&self, word: &str) -> bool {
        self.vocabulary.contains(word)
    }

    /// Closest vocabulary word, if unique within `max_distance`
    pub fn suggest(&self, word: &str, max_distance: usize) -> Option<&'static str> {
        if word.chars().count() < MIN_WORD_LEN || self.is_known(word) {
            return None;
        }

        let mut best: Option<(&'static str, usize)> = None;
        let mut tied = false;
        for candidate in &self.vocabulary {
            let distance = strsim::levenshtein(word, candidate);
            if distance == 0 || distance > max_distance {
                continue;
            }
            match best {
                Some((_, d)) if distance > d => {}
                Some((_, d)) if distance == d => tied = true,
                _ => {
                    best = Some((*candidate, distance));
                    tied = false;
                }
            }
        }

        if tied {
            None
        } else {
            best.map(|(w, _)| w)
        }
    }

    /// Rewrite misspelled words in the folded view of `query`
    pub fn correct(&self, query: &mut NormalizedQuery, max_distance: usize) -> Vec<Correction> {
        let spans: Vec<_> = self
            .word
            .find_iter(&query.folded)
            .filter_map(|m| {
                self.suggest(m.as_str(), max_distance)
                    .map(|to| (m.range(), m.as_str().to_string(), to))
            })
            .collect();

        let mut corrections = Vec::with_capacity(spans.len());
        // Back to front so earlier ranges stay valid
        for (range, from, to) in spans.into_iter().rev() {
            query.replace_folded(range, to);
            corrections.push(Correction { from, to });
        }
        corrections.reverse();

        if !corrections.is_empty() {
            debug!(count = corrections.len(), corrections = ?corrections, "Typo pre-pass applied");
        }
        corrections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_fixes_single_edit() {
        let corrector = TypoCorrector::new().unwrap();
        assert_eq!(corrector.suggest("avancment", 1), Some("avancement"));
        assert_eq!(corrector.suggest("deadlin", 1), Some("deadline"));
    }

    #[test]
    fn test_known_and_short_words_untouched() {
        let corrector = TypoCorrector::new().unwrap();
        assert_eq!(corrector.suggest("passe", 1), None);
        assert_eq!(corrector.suggest("lse", 1), None);
        assert_eq!(corrector.suggest("zzzzzz", 1), None);
    }

    #[test]
    fn test_correct_rewrites_folded_view_only() {
        let corrector = TypoCorrector::new().unwrap();
        let mut nq = NormalizedQuery::new("Liste les projets anulés");
        let fixes = corrector.correct(&mut nq, 1);
        assert_eq!(nq.folded, "liste les projets annules");
        assert_eq!(nq.display, "Liste les projets anulés");
        assert_eq!(fixes.len(), 1);
    }
}
