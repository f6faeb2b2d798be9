//! Project creation.
//!
//! The name follows the create phrase ("crée le projet Nuit Blanche"),
//! optionally introduced by "nommé"/"called" or quoted, and stops at the
//! first word that opens another field. Other fields reuse what the filter,
//! progress and deadline extractors already found.

use std::ops::Range;

use chrono::NaiveDate;
use regex::Regex;

use super::filters::FilterExtraction;
use super::ExtractInput;
use crate::error::ParseError;
use crate::lexicon::Lexicon;
use crate::types::CreateData;

const NAME_TERMINATORS: &[&str] = &[
    "avec", "with", "en", "pour", "for", "deadline", "echeance", "style", "genre", "collab",
    "label", "statut", "status", "qui", "dont", "et", "and", "avancement", "progress", "a", "au",
    "due", "pret", "ready",
];

const MAX_NAME_WORDS: usize = 6;

/// Pieces gathered by the other extractors
#[derive(Debug, Clone, Default)]
pub struct CreateFields {
    pub progress: Option<u8>,
    pub deadline: Option<NaiveDate>,
    pub note: Option<String>,
}

pub struct CreateExtractor {
    name_lead: Regex,
}

impl CreateExtractor {
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            name_lead: Regex::new(
                r"^\s*(?:(?:nomme|nommee|appele|appelee|intitule|intitulee|called|named|titled)\s+)?:?\s*",
            )?,
        })
    }

    /// Folded range of the project name
    fn name_range(&self, lexicon: &Lexicon, input: &ExtractInput<'_>) -> Option<Range<usize>> {
        let text = input.text;
        let phrase = lexicon.create_phrase.find(text)?;
        let lead = self.name_lead.find(&text[phrase.end()..])?;
        let start = phrase.end() + lead.end();
        let rest = text.get(start..)?;

        // Quoted names run to the closing quote
        if let Some(open) = rest.chars().next().filter(|c| "\"'«“".contains(*c)) {
            let body = &rest[open.len_utf8()..];
            let close = body.find(['"', '\'', '»', '”']).unwrap_or(body.len());
            let from = start + open.len_utf8();
            return (close > 0).then(|| from..from + close);
        }

        let mut end = start;
        let mut words = 0;
        let mut offset = 0;
        for piece in rest.split(' ') {
            let piece_start = start + offset;
            offset += piece.len() + 1;
            if piece.is_empty() {
                continue;
            }
            let word = piece.trim_end_matches([',', ';', '.', '!', '?', ':']);
            if word.is_empty() || NAME_TERMINATORS.contains(&word) {
                break;
            }
            end = piece_start + word.len();
            words += 1;
            if word.len() != piece.len() || words == MAX_NAME_WORDS {
                break;
            }
        }

        (end > start).then_some(start..end)
    }

    pub fn extract(
        &self,
        lexicon: &Lexicon,
        input: &ExtractInput<'_>,
        filters: &FilterExtraction,
        fields: CreateFields,
    ) -> CreateData {
        let name_range = self.name_range(lexicon, input);
        let name = name_range
            .clone()
            .map(|r| input.display(r))
            .filter(|n| !n.is_empty());

        // A status word inside the name is part of the name
        let status = lexicon
            .status
            .mentions(input.text)
            .into_iter()
            .find(|m| {
                name_range
                    .as_ref()
                    .map_or(true, |r| m.end <= r.start || m.start >= r.end)
            })
            .map(|m| m.status);

        let f = &filters.filters;
        CreateData {
            name,
            status,
            progress: fields.progress,
            deadline: fields.deadline,
            collab: f.collab.clone(),
            style: f.style.clone(),
            label: f.label.clone(),
            label_final: f.label_final.clone(),
            note: fields.note,
        }
    }
}
