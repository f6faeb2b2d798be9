//! Filter Extractor
//!
//! Pulls scoping filters out of the folded query: status, progress ranges,
//! collaborator, style, labels, deadline presence, name. Also reports which
//! fields the user asked to see.

use std::ops::Range;

use regex::Regex;

use super::{percent_value, preceding_word, resolve_available, resolve_style, take_value, ExtractInput};
use crate::error::ParseError;
use crate::lexicon::tables::*;
use crate::lexicon::{build_alternation, word_regex, FieldKind, Lexicon};
use crate::normalize::{contains_word, normalize_text};
use crate::types::{FieldName, ParsedFilters};

/// Filters found in a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterExtraction {
    pub filters: ParsedFilters,
    pub fields_to_show: Vec<FieldName>,
    /// `N%` spans already used as a range filter
    pub consumed_percents: Vec<Range<usize>>,
    /// Span of the status mention used as `filters.status`
    pub status_span: Option<Range<usize>>,
}

impl FilterExtraction {
    pub fn is_consumed(&self, span: &Range<usize>) -> bool {
        self.consumed_percents
            .iter()
            .any(|c| c.start < span.end && span.start < c.end)
    }
}

pub fn field_name(kind: FieldKind) -> FieldName {
    match kind {
        FieldKind::Status => FieldName::Status,
        FieldKind::Progress => FieldName::Progress,
        FieldKind::Deadline => FieldName::Deadline,
        FieldKind::Collab => FieldName::Collab,
        FieldKind::Style => FieldName::Style,
        FieldKind::Label => FieldName::Label,
        FieldKind::LabelFinal => FieldName::LabelFinal,
        FieldKind::Note => FieldName::Note,
    }
}

pub struct FilterExtractor {
    min_progress: Regex,
    max_progress: Regex,
    between_progress: Regex,
    exact_progress: Regex,
    progress_noun_after: Regex,
    collab_keyword: Regex,
    avec: Regex,
    style_keyword: Regex,
    label_final_keyword: Regex,
    label_keyword: Regex,
    has_deadline: Regex,
    no_deadline: Regex,
    no_progress: Regex,
    show_marker: Regex,
    field_alias: Regex,
    search_lead: Regex,
}

impl FilterExtractor {
    pub fn new() -> Result<Self, ParseError> {
        let progress_nouns = build_alternation(PROGRESS_NOUNS);
        let project_nouns = build_alternation(PROJECT_NOUNS);

        Ok(Self {
            min_progress: Regex::new(
                r"(?:\b(?:plus de|au moins|au-dessus de|au dessus de|superieur a|minimum|more than|at least|over|above)\s*|>=?\s*)(\d{1,3})\s*(%)?",
            )?,
            max_progress: Regex::new(
                r"(?:\b(?:moins de|au plus|en dessous de|en-dessous de|sous|inferieur a|maximum|less than|at most|under|below)\s*|<=?\s*)(\d{1,3})\s*(%)?",
            )?,
            between_progress: Regex::new(
                r"\b(?:entre|between)\s+(\d{1,3})\s*%?\s*(?:et|and|-)\s*(\d{1,3})\s*(%)?",
            )?,
            exact_progress: Regex::new(&format!(
                r"\b(?:{}|{})\s+(?:(?:a|at|de|of)\s+)(\d{{1,3}})\s*%",
                project_nouns, progress_nouns
            ))?,
            progress_noun_after: Regex::new(&format!(
                r"\b(\d{{1,3}})\s*%\s*(?:d'|de\s+|of\s+)?{}\b",
                progress_nouns
            ))?,
            collab_keyword: Regex::new(
                r"\b(?:collaborations?|collaborateurs?|collabs?|featurings?|feat)\b\.?\s+(?:(?:avec|with|de)\s+)?",
            )?,
            avec: Regex::new(r"\b(?:avec|with|feat)\s+")?,
            style_keyword: Regex::new(r"\b(?:styles?|genres?)\s+(?:(?:de|du)\s+)?")?,
            label_final_keyword: Regex::new(
                r"\b(?:labels? finals?|labels finaux|final labels?)\s+(?:(?:de|du|chez)\s+)?",
            )?,
            label_keyword: Regex::new(r"\blabels?\s+(?:(?:de|du|chez)\s+)?")?,
            has_deadline: word_regex(DEADLINE_POSSESSION_PHRASES)?,
            no_deadline: word_regex(DEADLINE_ABSENCE_PHRASES)?,
            no_progress: word_regex(NO_PROGRESS_PHRASES)?,
            show_marker: word_regex(SHOW_MARKERS)?,
            field_alias: word_regex(&keys(FIELD_ALIASES))?,
            search_lead: Regex::new(&format!(
                r"\b{}\b(?:\s+(?:le|la|les|un|une|the|a|an|for))?(?:\s+{})?(?:\s+(?:nomme|nommee|appele|appelee|called|named))?\s*",
                build_alternation(SEARCH_VERBS),
                project_nouns
            ))?,
        })
    }

    pub fn extract(&self, lexicon: &Lexicon, input: &ExtractInput<'_>) -> FilterExtraction {
        let text = input.text;
        let mut out = FilterExtraction::default();
        let has_update_verb = lexicon.has_update_verb(text);

        if let Some(mention) = lexicon.status.first(text) {
            out.filters.status = Some(mention.status);
            out.status_span = Some(mention.start..mention.end);
        }

        self.extract_progress(lexicon, text, has_update_verb, &mut out);

        let mut keyword_fields = Vec::new();
        self.extract_collab(input, &mut out, &mut keyword_fields);
        self.extract_style(input, &mut out, &mut keyword_fields);
        self.extract_labels(input, &mut out, &mut keyword_fields);

        if self.has_deadline.is_match(text) {
            out.filters.has_deadline = Some(true);
        } else if self.no_deadline.is_match(text) {
            out.filters.has_deadline = Some(false);
        }

        if self.no_progress.is_match(text) {
            out.filters.no_progress = Some(true);
        }

        out.fields_to_show = self.fields_to_show(text, &keyword_fields);
        out.filters = out.filters.compact();
        out
    }

    fn extract_progress(
        &self,
        lexicon: &Lexicon,
        text: &str,
        has_update_verb: bool,
        out: &mut FilterExtraction,
    ) {
        let progress_context = lexicon.mentions_progress(text);
        let filters = &mut out.filters;

        if let Some(caps) = self.between_progress.captures(text) {
            if caps.get(3).is_some() || progress_context {
                let low = percent_value(&caps[1]);
                let high = percent_value(&caps[2]);
                if let (Some(low), Some(high)) = (low, high) {
                    filters.min_progress = Some(low.min(high));
                    filters.max_progress = Some(low.max(high));
                    out.consumed_percents.push(caps.get(0).map_or(0..0, |m| m.range()));
                }
            }
        }

        if filters.min_progress.is_none() {
            if let Some(caps) = self.min_progress.captures(text) {
                if caps.get(2).is_some() || progress_context {
                    filters.min_progress = percent_value(&caps[1]);
                    out.consumed_percents.push(caps.get(0).map_or(0..0, |m| m.range()));
                }
            }
        }

        if filters.max_progress.is_none() {
            if let Some(caps) = self.max_progress.captures(text) {
                if caps.get(2).is_some() || progress_context {
                    filters.max_progress = percent_value(&caps[1]);
                    out.consumed_percents.push(caps.get(0).map_or(0..0, |m| m.range()));
                }
            }
        }

        if filters.min_progress.is_some() || filters.max_progress.is_some() {
            return;
        }

        // "50% d'avancement" qualifies records whatever the verb
        if let Some(caps) = self.progress_noun_after.captures(text) {
            let value = percent_value(&caps[1]);
            filters.min_progress = value;
            filters.max_progress = value;
            out.consumed_percents.push(caps.get(0).map_or(0..0, |m| m.range()));
            return;
        }

        // "projets a 50%" is a filter only when nothing is being modified
        if !has_update_verb {
            if let Some(caps) = self.exact_progress.captures(text) {
                let value = percent_value(&caps[1]);
                filters.min_progress = value;
                filters.max_progress = value;
                out.consumed_percents.push(caps.get(0).map_or(0..0, |m| m.range()));
            }
        }
    }

    fn extract_collab(
        &self,
        input: &ExtractInput<'_>,
        out: &mut FilterExtraction,
        keyword_fields: &mut Vec<FieldKind>,
    ) {
        let text = input.text;

        for m in self.collab_keyword.find_iter(text) {
            if let Some(range) = take_value(text, m.end()) {
                let literal = input.display(range);
                out.filters.collab = Some(super::resolve_collab(&literal, input.available_collabs));
                keyword_fields.push(FieldKind::Collab);
                return;
            }
        }

        // Bare "avec X" counts only when X is a known collaborator
        for m in self.avec.find_iter(text) {
            if let Some(range) = take_value(text, m.end()) {
                let literal = input.display(range);
                if let Some(name) = resolve_available(&literal, input.available_collabs) {
                    out.filters.collab = Some(name);
                    return;
                }
            }
        }
    }

    fn extract_style(
        &self,
        input: &ExtractInput<'_>,
        out: &mut FilterExtraction,
        keyword_fields: &mut Vec<FieldKind>,
    ) {
        let text = input.text;

        for m in self.style_keyword.find_iter(text) {
            if let Some(range) = take_value(text, m.end()) {
                let literal = input.display(range);
                out.filters.style = Some(resolve_style(&literal, input.available_styles));
                keyword_fields.push(FieldKind::Style);
                return;
            }
        }

        // Available style names mentioned on their own ("les projets trap")
        let mut best: Option<&String> = None;
        for style in input.available_styles {
            let folded = normalize_text(style);
            if contains_word(text, &folded) && best.map_or(true, |b| b.len() < style.len()) {
                best = Some(style);
            }
        }
        if let Some(style) = best {
            out.filters.style = Some(style.clone());
        }
    }

    fn extract_labels(
        &self,
        input: &ExtractInput<'_>,
        out: &mut FilterExtraction,
        keyword_fields: &mut Vec<FieldKind>,
    ) {
        let text = input.text;

        if let Some(m) = self.label_final_keyword.find(text) {
            if let Some(range) = take_value(text, m.end()) {
                out.filters.label_final = Some(input.display(range));
                keyword_fields.push(FieldKind::LabelFinal);
            }
        }

        for m in self.label_keyword.find_iter(text) {
            let rest = &text[m.end()..];
            if rest.starts_with("final") || rest.starts_with("finaux") {
                continue;
            }
            // "final label X" was handled above
            if preceding_word(text, m.start()) == Some("final") {
                continue;
            }
            if let Some(range) = take_value(text, m.end()) {
                out.filters.label = Some(input.display(range));
                keyword_fields.push(FieldKind::Label);
                break;
            }
        }
    }

    fn fields_to_show(&self, text: &str, keyword_fields: &[FieldKind]) -> Vec<FieldName> {
        let Some(marker) = self.show_marker.find(text) else {
            return Vec::new();
        };

        let mut fields = Vec::new();
        for m in self.field_alias.find_iter(&text[marker.start()..]) {
            let Some(kind) = field_kind(m.as_str()) else {
                continue;
            };
            if keyword_fields.contains(&kind) {
                continue;
            }
            let name = field_name(kind);
            if !fields.contains(&name) {
                fields.push(name);
            }
        }
        fields
    }

    /// Search term after a search verb ("cherche le projet Nuit Blanche")
    pub fn search_name(&self, lexicon: &Lexicon, input: &ExtractInput<'_>) -> Option<String> {
        let m = self.search_lead.find(input.text)?;
        let rest = input.text[m.end()..].trim();
        if rest.is_empty() {
            return None;
        }
        // A status or an "all projects" phrase is a filter, not a name
        if lexicon.status.matches_exactly_any(rest) || lexicon.all_projects.is_match(rest) {
            return None;
        }
        let name = input.display(m.end()..input.text.len());
        let name = crate::normalize::strip_quotes(&name).to_string();
        (!name.is_empty()).then_some(name)
    }
}
