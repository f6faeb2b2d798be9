//! Metadata rewrites and notes.
//!
//! Collaborator, style and label changes come in three phrasings:
//! - two-sided:    "collab Nina à Jules"    (criteria Nina, new value Jules)
//! - single-sided: "met la collab à Jules"  (new value only)
//! - inverted:     "mets Jules en collab"
//!
//! plus "remplace Nina par Jules" when the first name is a known
//! collaborator or style.

use regex::Regex;

use super::{following_word, resolve_available, resolve_collab, resolve_style, take_value, ExtractInput};
use crate::error::ParseError;
use crate::lexicon::tables::NOTE_VERBS;
use crate::lexicon::{build_alternation, FieldKind, Lexicon};
use crate::normalize::strip_quotes;

/// Metadata rewrite found in an update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataExtraction {
    pub collab: Option<String>,
    pub style: Option<String>,
    pub label: Option<String>,
    pub label_final: Option<String>,
    pub new_collab: Option<String>,
    pub new_style: Option<String>,
    pub new_label: Option<String>,
    pub new_label_final: Option<String>,
}

impl MetadataExtraction {
    pub fn has_rewrite(&self) -> bool {
        self.new_collab.is_some()
            || self.new_style.is_some()
            || self.new_label.is_some()
            || self.new_label_final.is_some()
    }

    fn set(&mut self, kind: FieldKind, from: Option<String>, to: String) {
        let (criteria, target) = match kind {
            FieldKind::Collab => (&mut self.collab, &mut self.new_collab),
            FieldKind::Style => (&mut self.style, &mut self.new_style),
            FieldKind::Label => (&mut self.label, &mut self.new_label),
            FieldKind::LabelFinal => (&mut self.label_final, &mut self.new_label_final),
            _ => return,
        };
        if target.is_some() {
            return;
        }
        if from.is_some() {
            *criteria = from;
        }
        *target = Some(to);
    }
}

/// A note and where its body starts in the folded text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteExtraction {
    pub note: String,
    /// Folded byte offset where the note body starts
    pub body_start: usize,
    /// Folded byte offset where the note keyword starts
    pub keyword_start: usize,
}

const CONNECTORS: &[&str] = &["a", "au", "en", "par", "to", "by", "->", "=>", "vers"];
const SINGLE_CONNECTORS: &[&str] = &["a", "au", "en", "par", "to", "as", "pour", "for", "=", ":", "sur"];

pub struct MetadataExtractor {
    keywords: Vec<(FieldKind, Regex)>,
    inverted: Regex,
    replace: Regex,
    note_lead: Regex,
    note_prefix: Regex,
}

impl MetadataExtractor {
    pub fn new() -> Result<Self, ParseError> {
        let keywords = vec![
            (
                FieldKind::LabelFinal,
                Regex::new(r"\b(?:labels? finals?|labels finaux|final labels?)\b\s*")?,
            ),
            (FieldKind::Label, Regex::new(r"\blabels?\b\s*")?),
            (
                FieldKind::Collab,
                Regex::new(r"\b(?:collaborations?|collaborateurs?|collabs?|feat)\b\s*(?:(?:avec|with|de)\s+)?")?,
            ),
            (FieldKind::Style, Regex::new(r"\b(?:styles?|genres?)\b\s*(?:(?:de|du)\s+)?")?),
        ];

        Ok(Self {
            keywords,
            inverted: Regex::new(
                r"\b(?:met|mets|mettre|ajoute|rajoute|add|put|set)\s+(.+?)\s+(?:en|comme|as)\s+(?:(?:la|le|the|nouveau|nouvelle|new)\s+)?(collab(?:oratrice|orateur|oration)?|feat|style|genre|label final|label)\b",
            )?,
            replace: Regex::new(r"\b(?:remplace|remplacer|replace)\s+(.+?)\s+(?:par|by|with)\s+(.+)$")?,
            note_lead: Regex::new(&format!(
                r"\b{}\b\s+(?:(?:une|un|la|cette|a|the|this)\s+)?(?:note|commentaire|comment)s?\b",
                build_alternation(NOTE_VERBS)
            ))?,
            note_prefix: Regex::new(r"^(?:note|commentaire|comment)\s*:")?,
        })
    }

    /// Note body from the display text; the folded body offset lets the
    /// caller cut it out of further analysis
    pub fn note(&self, input: &ExtractInput<'_>) -> Option<NoteExtraction> {
        let text = input.text;

        let (keyword_start, mut body_start, prefixed) = if let Some(m) = self.note_prefix.find(text) {
            (m.start(), m.end(), true)
        } else {
            let m = self.note_lead.find(text)?;
            (m.start(), m.end(), false)
        };

        // "ajoute une note aux projets terminés : ..." keeps the scope phrase
        let colon = if prefixed { None } else { text[body_start..].find(':') };
        if let Some(colon) = colon {
            body_start += colon + 1;
        } else {
            let rest = &text[body_start..];
            let trimmed = rest.trim_start();
            for lead in ["disant", "qui dit", "saying", "that says", "-"] {
                if let Some(after) = trimmed.strip_prefix(lead) {
                    body_start += rest.len() - after.len();
                    break;
                }
            }
        }

        let body = input.display(body_start..text.len());
        let note = strip_quotes(&body).trim().to_string();
        if note.is_empty() {
            return None;
        }
        Some(NoteExtraction {
            note,
            body_start,
            keyword_start,
        })
    }

    pub fn extract(&self, lexicon: &Lexicon, input: &ExtractInput<'_>) -> MetadataExtraction {
        let text = input.text;
        let mut out = MetadataExtraction::default();

        for (kind, keyword) in &self.keywords {
            for m in keyword.find_iter(text) {
                // "label" inside "label final" belongs to the other field
                if *kind == FieldKind::Label {
                    let rest = &text[m.end()..];
                    if rest.starts_with("final") || rest.starts_with("finaux") {
                        continue;
                    }
                    if super::preceding_word(text, m.start()) == Some("final") {
                        continue;
                    }
                }
                if let Some((from, to)) = self.rewrite_after(lexicon, input, *kind, m.end()) {
                    out.set(*kind, from, to);
                    break;
                }
            }
        }

        if let Some(caps) = self.inverted.captures(text) {
            if let (Some(value), Some(field)) = (caps.get(1), caps.get(2)) {
                let kind = match field.as_str() {
                    "style" | "genre" => FieldKind::Style,
                    "label final" => FieldKind::LabelFinal,
                    "label" => FieldKind::Label,
                    _ => FieldKind::Collab,
                };
                let literal = strip_determiner(&input.display(value.range()));
                if !literal.is_empty() && !lexicon.status.matches_exactly_any(&crate::normalize::normalize_text(&literal)) {
                    let resolved = self.resolve(kind, &literal, input);
                    out.set(kind, None, resolved);
                }
            }
        }

        if let Some(caps) = self.replace.captures(text) {
            if let (Some(old), Some(new)) = (caps.get(1), caps.get(2)) {
                let old_literal = input.display(old.range());
                let new_literal = strip_quotes(&input.display(new.range())).to_string();
                if let Some(name) = resolve_available(&old_literal, input.available_collabs) {
                    let resolved = self.resolve(FieldKind::Collab, &new_literal, input);
                    out.set(FieldKind::Collab, Some(name), resolved);
                } else if let Some(name) = resolve_available(&old_literal, input.available_styles) {
                    let resolved = self.resolve(FieldKind::Style, &new_literal, input);
                    out.set(FieldKind::Style, Some(name), resolved);
                }
            }
        }

        out
    }

    /// Two-sided or single-sided value after a field keyword
    fn rewrite_after(
        &self,
        lexicon: &Lexicon,
        input: &ExtractInput<'_>,
        kind: FieldKind,
        pos: usize,
    ) -> Option<(Option<String>, String)> {
        let text = input.text;

        if status_follows(lexicon, text, pos) {
            return None;
        }

        // single-sided: keyword, connector, value
        if let Some(connector) = following_word(text, pos) {
            let connector = connector.trim_end_matches(':');
            let is_colon = text[pos..].trim_start().starts_with([':', '=']);
            if SINGLE_CONNECTORS.contains(&connector) || is_colon {
                let after = connector_end(text, pos)?;
                let to = self.value(lexicon, input, kind, after)?;
                return Some((None, to));
            }
        }

        // two-sided: keyword, old value, connector, new value
        let old = take_value(text, pos)?;
        let connector = following_word(text, old.end)?;
        if !CONNECTORS.contains(&connector) || status_follows(lexicon, text, old.end) {
            return None;
        }
        let after = connector_end(text, old.end)?;
        let to = self.value(lexicon, input, kind, after)?;
        let from = self.resolve(kind, &input.display(old), input);
        Some((Some(from), to))
    }

    /// New value at `pos`; statuses and numbers are not metadata
    fn value(
        &self,
        lexicon: &Lexicon,
        input: &ExtractInput<'_>,
        kind: FieldKind,
        pos: usize,
    ) -> Option<String> {
        let text = input.text;
        let range = take_value(text, pos)?;
        let folded = &text[range.clone()];
        if folded.chars().all(|c| c.is_ascii_digit() || c == '%')
            || lexicon.status.matches_exactly_any(folded)
        {
            return None;
        }
        let literal = strip_determiner(&input.display(range));
        (!literal.is_empty()).then(|| self.resolve(kind, &literal, input))
    }

    fn resolve(&self, kind: FieldKind, literal: &str, input: &ExtractInput<'_>) -> String {
        match kind {
            FieldKind::Collab => resolve_collab(literal, input.available_collabs),
            FieldKind::Style => resolve_style(literal, input.available_styles),
            _ => literal.to_string(),
        }
    }
}

/// A status phrase ("en cours") starts at the next word after `pos`
fn status_follows(lexicon: &Lexicon, text: &str, pos: usize) -> bool {
    let Some(rest) = text.get(pos..) else {
        return false;
    };
    let next = pos + (rest.len() - rest.trim_start().len());
    lexicon.status.mentions(text).iter().any(|m| m.start == next)
}

/// End of the connector word that starts at or after `pos`
fn connector_end(text: &str, pos: usize) -> Option<usize> {
    let rest = text.get(pos..)?;
    let lead = rest.len() - rest.trim_start().len();
    let word_len = rest
        .trim_start()
        .find(' ')
        .unwrap_or(rest.trim_start().len());
    Some(pos + lead + word_len)
}

fn strip_determiner(value: &str) -> String {
    let trimmed = value.trim();
    for det in ["le ", "la ", "les ", "l'", "the "] {
        if trimmed.len() > det.len() && trimmed.is_char_boundary(det.len()) {
            let (head, tail) = trimmed.split_at(det.len());
            if head.eq_ignore_ascii_case(det) {
                return tail.trim().to_string();
            }
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizedQuery;
    use chrono::NaiveDate;

    fn with_input<T>(query: &str, collabs: &[&str], f: impl FnOnce(&ExtractInput<'_>) -> T) -> T {
        let nq = NormalizedQuery::new(query);
        let collabs: Vec<String> = collabs.iter().map(|s| s.to_string()).collect();
        let input = ExtractInput {
            query: &nq,
            text: &nq.folded,
            available_collabs: &collabs,
            available_styles: &[],
            today: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        };
        f(&input)
    }

    fn extract(query: &str, collabs: &[&str]) -> MetadataExtraction {
        let lexicon = Lexicon::new().unwrap();
        let extractor = MetadataExtractor::new().unwrap();
        with_input(query, collabs, |input| extractor.extract(&lexicon, input))
    }

    #[test]
    fn test_two_sided_collab() {
        let out = extract("change la collab nina à jules", &["Nina", "Jules"]);
        assert_eq!(out.collab.as_deref(), Some("Nina"));
        assert_eq!(out.new_collab.as_deref(), Some("Jules"));
    }

    #[test]
    fn test_single_sided_style() {
        let out = extract("met le style en hip hop", &[]);
        assert_eq!(out.new_style.as_deref(), Some("Hip-Hop"));
        assert_eq!(out.style, None);
    }

    #[test]
    fn test_inverted_collab() {
        let out = extract("mets Jules en collab", &["Jules"]);
        assert_eq!(out.new_collab.as_deref(), Some("Jules"));
    }

    #[test]
    fn test_label_final_not_taken_as_label() {
        let out = extract("change le label final en Sony Music", &[]);
        assert_eq!(out.new_label_final.as_deref(), Some("Sony Music"));
        assert_eq!(out.new_label, None);
    }

    #[test]
    fn test_replace_known_collab() {
        let out = extract("remplace Nina par Jules", &["Nina", "Jules"]);
        assert_eq!(out.collab.as_deref(), Some("Nina"));
        assert_eq!(out.new_collab.as_deref(), Some("Jules"));
    }

    #[test]
    fn test_status_value_is_not_metadata() {
        let out = extract("passe les projets en collab avec nina en cours", &["Nina"]);
        assert!(!out.has_rewrite());
    }

    #[test]
    fn test_note_with_colon_keeps_scope() {
        let extractor = MetadataExtractor::new().unwrap();
        let note = with_input(
            "Ajoute une note aux projets terminés : Rappeler Nina lundi",
            &[],
            |input| extractor.note(input),
        )
        .unwrap();
        assert_eq!(note.note, "Rappeler Nina lundi");
    }

    #[test]
    fn test_note_prefix_and_saying() {
        let extractor = MetadataExtractor::new().unwrap();
        let note = with_input("note: mix à refaire", &[], |input| extractor.note(input)).unwrap();
        assert_eq!(note.note, "mix à refaire");

        let note = with_input("ajoute un commentaire disant \"OK pour le clip\"", &[], |input| {
            extractor.note(input)
        })
        .unwrap();
        assert_eq!(note.note, "OK pour le clip");
    }
}
