//! Progress target extraction.
//!
//! Resolution order:
//! 1. "de X% à Y"         filter X, target Y
//! 2. trailing bare number after an update verb ("met les à 80")
//! 3. last "N%" not consumed by a range filter and not followed by a
//!    progress noun or a date word
//! 4. named "avancement à N"

use regex::Regex;

use super::filters::FilterExtraction;
use super::percent_value;
use crate::error::ParseError;
use crate::lexicon::tables::PROGRESS_NOUNS;
use crate::lexicon::{build_alternation, Lexicon};

/// Progress values found for an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressExtraction {
    pub target: Option<u8>,
    /// Current progress the records must have (min = max)
    pub exact_filter: Option<u8>,
}

pub struct ProgressExtractor {
    from_to: Regex,
    trailing_bare: Regex,
    percent: Regex,
    noun_or_date_after: Regex,
    named: Regex,
}

impl ProgressExtractor {
    pub fn new() -> Result<Self, ParseError> {
        let nouns = build_alternation(PROGRESS_NOUNS);
        Ok(Self {
            from_to: Regex::new(
                r"\b(?:de|du|from)\s+(\d{1,3})\s*(%)?\s+(?:a|au|to)\s+(\d{1,3}|zero)\s*(%)?",
            )?,
            trailing_bare: Regex::new(r"\b(?:a|au|to|at|sur)\s+(\d{1,3}|zero)\s*[.!]*$")?,
            percent: Regex::new(r"\b(\d{1,3})\s*%")?,
            noun_or_date_after: Regex::new(&format!(
                r"^\s*(?:(?:d'|de\s+|of\s+)?{nouns}\b|(?:d'ici|avant|apres|dans|demain|before|by|in|on|tomorrow)\b|le\s+\d)"
            ))?,
            named: Regex::new(&format!(
                r"\b{nouns}\s+(?:a|au|to|at|de|=|:)\s*(\d{{1,3}}|zero)\b"
            ))?,
        })
    }

    pub fn extract(
        &self,
        lexicon: &Lexicon,
        text: &str,
        filters: &FilterExtraction,
    ) -> ProgressExtraction {
        let mut out = ProgressExtraction::default();
        let progress_context = lexicon.mentions_progress(text);
        let deadline_context = lexicon.mentions_deadline(text);

        // 1. explicit "de X% a Y"
        if let Some(caps) = self.from_to.captures(text) {
            let has_percent = caps.get(2).is_some() || caps.get(4).is_some();
            if has_percent || progress_context {
                out.exact_filter = percent_value(&caps[1]);
                out.target = percent_value(&caps[3]);
                return out;
            }
        }

        // 2. trailing bare number, unless this is a deadline sentence
        if lexicon.has_update_verb(text) && (!deadline_context || progress_context) {
            if let Some(caps) = self.trailing_bare.captures(text) {
                out.target = percent_value(&caps[1]);
                let start = caps.get(0).map_or(text.len(), |m| m.start());
                // An earlier "projets a N%" then qualifies the records
                out.exact_filter = self
                    .percent
                    .captures_iter(&text[..start])
                    .filter(|c| c.get(0).is_some_and(|m| !filters.is_consumed(&m.range())))
                    .last()
                    .and_then(|c| percent_value(&c[1]));
                return out;
            }
        }

        // 3. last unconsumed N%
        let last_percent = self
            .percent
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                if filters.is_consumed(&whole.range()) {
                    return None;
                }
                if self.noun_or_date_after.is_match(&text[whole.end()..]) {
                    return None;
                }
                percent_value(&caps[1])
            })
            .last();
        if last_percent.is_some() {
            out.target = last_percent;
            return out;
        }

        // 4. "avancement a N"
        if let Some(caps) = self.named.captures(text) {
            out.target = percent_value(&caps[1]);
        }

        out
    }
}
