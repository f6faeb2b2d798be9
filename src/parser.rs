//! Query Parser
//!
//! Turns one free-form sentence into a [`ParseQueryResult`]:
//!
//! ```text
//! validate ─▶ normalize (+ typo pass) ─▶ note cut ─▶ filters ─▶ classify
//!                                                          │
//!             ┌──────────────┬──────────────┬──────────────┤
//!           update         create      list/count       search
//!   (transition, progress,  (name +      (filters +      (name)
//!    deadline, metadata,    fields)      deadline date)
//!    status inference)
//! ```
//!
//! `parse` never fails. Every validation or internal error becomes a
//! "not understood" result whose clarification is in the query's language.

use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::{Classifier, Intent, Signals};
use crate::config::ParserConfig;
use crate::error::{ParseError, ValidationError};
use crate::extract::create::CreateFields;
use crate::extract::{
    CreateExtractor, DeadlineExtractor, ExtractInput, FilterExtraction, FilterExtractor,
    MetadataExtractor, NoteExtraction, ProgressExtractor, StatusTarget, TransitionExtractor,
};
use crate::inference::{StatusInference, StatusInferenceEngine};
use crate::lexicon::typo::{Correction, TypoCorrector};
use crate::lexicon::Lexicon;
use crate::messages;
use crate::normalize::{
    normalize_text, validate_history, validate_last_filters, validate_names, validate_query,
    NormalizedQuery,
};
use crate::types::{
    FieldName, HistoryMessage, Lang, ParseQueryResult, ParsedCommand, ParsedFilters, UpdateData,
};

// =============================================================================
// INPUTS
// =============================================================================

/// Everything besides the query that a parse may consult
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseContext<'a> {
    pub available_collabs: &'a [String],
    pub available_styles: &'a [String],
    pub history: &'a [HistoryMessage],
    pub last_filters: Option<&'a ParsedFilters>,
}

/// Owned request, as received over JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseRequest {
    pub query: String,
    pub available_collabs: Vec<String>,
    pub available_styles: Vec<String>,
    pub conversation_history: Vec<HistoryMessage>,
    pub last_filters: Option<ParsedFilters>,
}

fn string_list(payload: &Value, field: &str) -> Result<Vec<String>, ValidationError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(ValidationError::InvalidItem {
                    field: field.into(),
                    index,
                    reason: "not a string".into(),
                }),
            })
            .collect(),
        Some(_) => Err(ValidationError::InvalidShape {
            field: field.into(),
            reason: "expected an array of strings".into(),
        }),
    }
}

impl ParseRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Check the shape of an untyped payload
    pub fn from_value(payload: &Value) -> Result<Self, ValidationError> {
        let query = match payload.get("query") {
            Some(Value::String(q)) => q.clone(),
            _ => {
                return Err(ValidationError::NotAString {
                    field: "query".into(),
                })
            }
        };

        let conversation_history = match payload.get("conversationHistory") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    serde_json::from_value::<HistoryMessage>(item.clone()).map_err(|e| {
                        ValidationError::InvalidItem {
                            field: "conversationHistory".into(),
                            index,
                            reason: e.to_string(),
                        }
                    })
                })
                .collect::<Result<_, _>>()?,
            Some(_) => {
                return Err(ValidationError::InvalidShape {
                    field: "conversationHistory".into(),
                    reason: "expected an array".into(),
                })
            }
        };

        let last_filters = match payload.get("lastFilters") {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value::<ParsedFilters>(value.clone()).map_err(
                |e| ValidationError::InvalidShape {
                    field: "lastFilters".into(),
                    reason: e.to_string(),
                },
            )?),
        };

        Ok(Self {
            query,
            available_collabs: string_list(payload, "availableCollabs")?,
            available_styles: string_list(payload, "availableStyles")?,
            conversation_history,
            last_filters,
        })
    }

    pub fn context(&self) -> ParseContext<'_> {
        ParseContext {
            available_collabs: &self.available_collabs,
            available_styles: &self.available_styles,
            history: &self.conversation_history,
            last_filters: self.last_filters.as_ref(),
        }
    }
}

// =============================================================================
// OUTPUTS
// =============================================================================

/// Parse result plus what the router needs to resolve scope
#[derive(Debug, Clone)]
pub struct ParseDetails {
    pub result: ParseQueryResult,
    /// `None` when parsing stopped at validation
    pub intent: Option<Intent>,
    /// Folded query after the typo pass
    pub folded: String,
    /// Status filled in from the previous turn, not typed by the user
    pub inferred: Option<StatusInference>,
    pub corrections: Vec<Correction>,
}

impl ParseDetails {
    fn failed(result: ParseQueryResult) -> Self {
        Self {
            result,
            intent: None,
            folded: String::new(),
            inferred: None,
            corrections: Vec::new(),
        }
    }
}

// =============================================================================
// PARSER
// =============================================================================

pub struct QueryParser {
    config: ParserConfig,
    lexicon: Lexicon,
    filters: FilterExtractor,
    transitions: TransitionExtractor,
    progress: ProgressExtractor,
    deadline: DeadlineExtractor,
    metadata: MetadataExtractor,
    create: CreateExtractor,
    classifier: Classifier,
    inference: StatusInferenceEngine,
    typo: Option<TypoCorrector>,
    today: Option<NaiveDate>,
}

impl QueryParser {
    pub fn new(config: ParserConfig) -> Result<Self, ParseError> {
        let typo = if config.typo_tolerance {
            Some(TypoCorrector::new()?)
        } else {
            None
        };
        Ok(Self {
            lexicon: Lexicon::new()?,
            filters: FilterExtractor::new()?,
            transitions: TransitionExtractor::new()?,
            progress: ProgressExtractor::new()?,
            deadline: DeadlineExtractor::new()?,
            metadata: MetadataExtractor::new()?,
            create: CreateExtractor::new()?,
            classifier: Classifier::new()?,
            inference: StatusInferenceEngine::new(config.history_scan_depth)?,
            typo,
            today: None,
            config,
        })
    }

    /// Pin the date relative deadlines resolve against
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn parse(&self, query: &str, ctx: &ParseContext<'_>) -> ParseQueryResult {
        self.parse_detailed(query, ctx).result
    }

    /// Parse an untyped JSON payload
    pub fn parse_value(&self, payload: &Value) -> ParseQueryResult {
        match ParseRequest::from_value(payload) {
            Ok(request) => self.parse(&request.query, &request.context()),
            Err(e) => {
                let error = ParseError::from(e);
                warn!(error = %error, "Rejected parse payload");
                ParseQueryResult::not_understood(error.user_message(Lang::Fr), Lang::Fr)
            }
        }
    }

    pub fn parse_detailed(&self, query: &str, ctx: &ParseContext<'_>) -> ParseDetails {
        match self.try_parse(query, ctx) {
            Ok(details) => details,
            Err(error) => {
                let lang = if query.chars().count() <= self.config.max_query_len {
                    self.classifier.detect_lang(&normalize_text(query))
                } else {
                    Lang::Fr
                };
                warn!(error = %error, "Query not understood");
                ParseDetails::failed(ParseQueryResult::not_understood(
                    error.user_message(lang),
                    lang,
                ))
            }
        }
    }

    fn validate(&self, query: &str, ctx: &ParseContext<'_>) -> Result<(), ValidationError> {
        validate_query(query, &self.config)?;
        validate_names("availableCollabs", ctx.available_collabs, &self.config)?;
        validate_names("availableStyles", ctx.available_styles, &self.config)?;
        validate_history(ctx.history, &self.config)?;
        if let Some(filters) = ctx.last_filters {
            validate_last_filters(filters, &self.config)?;
        }
        Ok(())
    }

    fn try_parse(&self, query: &str, ctx: &ParseContext<'_>) -> Result<ParseDetails, ParseError> {
        self.validate(query, ctx)?;

        let mut normalized = NormalizedQuery::new(query);
        let corrections = match &self.typo {
            Some(corrector) => corrector.correct(&mut normalized, self.config.typo_max_distance),
            None => Vec::new(),
        };
        let today = self.today();
        let lexicon = &self.lexicon;

        // A note body is free text: keep it out of every other extractor
        let full = ExtractInput {
            query: &normalized,
            text: &normalized.folded,
            available_collabs: ctx.available_collabs,
            available_styles: ctx.available_styles,
            today,
        };
        let note = self.metadata.note(&full);
        let cut = note.as_ref().map_or(normalized.folded.len(), |n| note_cut(&normalized.folded, n));
        let input = ExtractInput {
            text: &normalized.folded[..cut],
            ..full
        };

        let filters = self.filters.extract(lexicon, &input);
        let lang = self.classifier.detect_lang(&normalized.folded);
        let classification = self.classifier.classify(
            lexicon,
            input.text,
            Signals {
                has_filters: !filters.filters.is_empty(),
                has_note: note.is_some() && !lexicon.create_phrase.is_match(input.text),
            },
        );

        let mut inferred = None;
        let result = match classification.intent {
            Intent::Meta | Intent::Conversational => ParseQueryResult::conversational(lang),
            Intent::Unknown => ParseQueryResult::not_understood(messages::not_understood(lang), lang),
            Intent::Update => {
                let (result, inference) = self.build_update(&input, filters, note, ctx, lang);
                inferred = inference;
                result
            }
            Intent::Create => self.build_create(&input, &filters, note, lang),
            Intent::Count => self.build_listing(&input, filters, ParsedCommand::Count, lang),
            Intent::List => self.build_listing(&input, filters, ParsedCommand::List, lang),
            Intent::Search => self.build_search(&input, filters, lang),
        };

        debug!(
            intent = ?classification.intent,
            query_type = ?result.query_type(),
            understood = result.understood,
            inferred = inferred.is_some(),
            "Query parsed"
        );

        Ok(ParseDetails {
            result,
            intent: Some(classification.intent),
            folded: normalized.folded.clone(),
            inferred,
            corrections,
        })
    }

    fn build_update(
        &self,
        input: &ExtractInput<'_>,
        extraction: FilterExtraction,
        note: Option<NoteExtraction>,
        ctx: &ParseContext<'_>,
        lang: Lang,
    ) -> (ParseQueryResult, Option<StatusInference>) {
        let lexicon = &self.lexicon;
        let text = input.text;
        let mut filters = extraction.filters.clone();
        let mut data = UpdateData::default();

        // status
        let target = self.transitions.extract(lexicon, text);
        if let Some(target) = &target {
            data.new_status = Some(target.new_status());
            match target {
                StatusTarget::Transition(t) => {
                    if filters.status == Some(t.from) {
                        filters.status = None;
                    }
                }
                StatusTarget::Single(m) => {
                    let same_span = extraction.status_span == Some(m.start..m.end);
                    if same_span || filters.status == Some(m.status) {
                        filters.status = None;
                    }
                }
            }
        }

        // progress
        let progress = self.progress.extract(lexicon, text, &extraction);
        data.new_progress = progress.target;
        if let Some(exact) = progress.exact_filter {
            if filters.min_progress.is_none() && filters.max_progress.is_none() {
                filters.min_progress = Some(exact);
                filters.max_progress = Some(exact);
            }
        }

        // deadline
        let deadline = self.deadline.extract(lexicon, text, input.today);
        data.new_deadline = deadline.new_deadline;
        data.push_deadline_by = deadline.push_by;
        data.requires_deadline = deadline.requires_deadline;

        // collab / style / labels
        let metadata = self.metadata.extract(lexicon, input);
        data.new_collab = metadata.new_collab;
        data.new_style = metadata.new_style;
        data.new_label = metadata.new_label;
        data.new_label_final = metadata.new_label_final;
        for (filter, criteria) in [
            (&mut filters.collab, metadata.collab),
            (&mut filters.style, metadata.style),
            (&mut filters.label, metadata.label),
            (&mut filters.label_final, metadata.label_final),
        ] {
            if criteria.is_some() {
                *filter = criteria;
            }
        }

        data.new_note = note.map(|n| n.note);

        if !data.has_mutation() && filters.no_progress == Some(true) {
            data.new_progress = Some(0);
            filters.no_progress = None;
        }

        drop_echoed_targets(&mut filters, &data);

        let mut filters = filters.compact();
        data.criteria = filters.clone();
        if let Some(StatusTarget::Transition(t)) = &target {
            data.criteria.status = Some(t.from);
        }

        let inferred = self.inference.infer(
            lexicon,
            text,
            &data.criteria,
            data.new_status,
            ctx.last_filters,
            ctx.history,
        );
        if let Some(found) = &inferred {
            filters.status = Some(found.status);
            data.criteria.status = Some(found.status);
        }

        if !data.has_mutation() {
            return (
                ParseQueryResult::not_understood(messages::update_without_change(lang), lang),
                None,
            );
        }

        let mut fields_to_show = extraction.fields_to_show;
        for field in data.touched_fields() {
            if !fields_to_show.contains(&field) {
                fields_to_show.push(field);
            }
        }

        let result = understood(
            filters,
            ParsedCommand::Update { update_data: data },
            lang,
            fields_to_show,
        );
        (result, inferred)
    }

    fn build_create(
        &self,
        input: &ExtractInput<'_>,
        extraction: &FilterExtraction,
        note: Option<NoteExtraction>,
        lang: Lang,
    ) -> ParseQueryResult {
        let lexicon = &self.lexicon;
        let progress = self.progress.extract(lexicon, input.text, extraction);
        let deadline = self
            .deadline
            .deadline_date(lexicon, input.text, input.today)
            .or_else(|| {
                self.deadline
                    .dates()
                    .find(input.text, input.today)
                    .map(|(date, _)| date)
            });

        let create_data = self.create.extract(
            lexicon,
            input,
            extraction,
            CreateFields {
                progress: progress.target,
                deadline,
                note: note.map(|n| n.note),
            },
        );

        let clarification = create_data
            .name
            .is_none()
            .then(|| messages::create_missing_name(lang));
        let mut result = understood(
            ParsedFilters::default(),
            ParsedCommand::Create { create_data },
            lang,
            Vec::new(),
        );
        result.clarification = clarification;
        result
    }

    fn build_listing(
        &self,
        input: &ExtractInput<'_>,
        extraction: FilterExtraction,
        command: ParsedCommand,
        lang: Lang,
    ) -> ParseQueryResult {
        let mut filters = extraction.filters;
        if filters.deadline_date.is_none() {
            filters.deadline_date = self
                .deadline
                .deadline_date(&self.lexicon, input.text, input.today);
        }
        understood(filters, command, lang, extraction.fields_to_show)
    }

    fn build_search(
        &self,
        input: &ExtractInput<'_>,
        extraction: FilterExtraction,
        lang: Lang,
    ) -> ParseQueryResult {
        match self.filters.search_name(&self.lexicon, input) {
            Some(name) => {
                let filters = ParsedFilters {
                    name: Some(name),
                    ..extraction.filters
                };
                understood(filters, ParsedCommand::Search, lang, extraction.fields_to_show)
            }
            // "cherche les projets terminés" is a listing
            None if !extraction.filters.is_empty() => {
                self.build_listing(input, extraction, ParsedCommand::List, lang)
            }
            None => ParseQueryResult::not_understood(messages::not_understood(lang), lang),
        }
    }
}

/// Where the analysed text stops when a note is present.
///
/// "ajoute une note aux projets terminés : ..." keeps its scope phrase; a
/// note without a colon is cut at its keyword.
fn note_cut(folded: &str, note: &NoteExtraction) -> usize {
    let head = &folded[..note.body_start];
    if head.trim_end().ends_with(':') {
        note.body_start
    } else {
        note.keyword_start
    }
}

/// A filter equal to its own target value would select nothing to change
fn drop_echoed_targets(filters: &mut ParsedFilters, data: &UpdateData) {
    if filters.status.is_some() && filters.status == data.new_status {
        filters.status = None;
    }
    if let (Some(min), Some(max), Some(target)) =
        (filters.min_progress, filters.max_progress, data.new_progress)
    {
        if min == max && min == target {
            filters.min_progress = None;
            filters.max_progress = None;
        }
    }
    for (filter, target) in [
        (&mut filters.collab, &data.new_collab),
        (&mut filters.style, &data.new_style),
        (&mut filters.label, &data.new_label),
        (&mut filters.label_final, &data.new_label_final),
    ] {
        let echoed = match (filter.as_deref(), target.as_deref()) {
            (Some(f), Some(t)) => normalize_text(f) == normalize_text(t),
            _ => false,
        };
        if echoed {
            *filter = None;
        }
    }
}

fn understood(
    filters: ParsedFilters,
    command: ParsedCommand,
    lang: Lang,
    fields_to_show: Vec<FieldName>,
) -> ParseQueryResult {
    ParseQueryResult {
        filters: filters.compact(),
        command,
        understood: true,
        clarification: None,
        lang,
        is_conversational: false,
        fields_to_show,
    }
}

// =============================================================================
// FREE FUNCTIONS
// =============================================================================

static DEFAULT_PARSER: LazyLock<Result<QueryParser, String>> =
    LazyLock::new(|| QueryParser::new(ParserConfig::default()).map_err(|e| e.to_string()));

/// Parse with the default configuration. Never fails.
pub fn parse_query(
    query: &str,
    available_collabs: &[String],
    available_styles: &[String],
    conversation_history: Option<&[HistoryMessage]>,
    last_filters: Option<&ParsedFilters>,
) -> ParseQueryResult {
    let ctx = ParseContext {
        available_collabs,
        available_styles,
        history: conversation_history.unwrap_or_default(),
        last_filters,
    };
    match DEFAULT_PARSER.as_ref() {
        Ok(parser) => parser.parse(query, &ctx),
        Err(message) => {
            let error = ParseError::Internal {
                message: message.clone(),
            };
            warn!(error = %error, "Default parser unavailable");
            ParseQueryResult::not_understood(error.user_message(Lang::Fr), Lang::Fr)
        }
    }
}

/// Parse an untyped JSON payload with the default configuration
pub fn parse_query_value(payload: &Value) -> ParseQueryResult {
    match DEFAULT_PARSER.as_ref() {
        Ok(parser) => parser.parse_value(payload),
        Err(message) => ParseQueryResult::not_understood(
            ParseError::Internal {
                message: message.clone(),
            }
            .user_message(Lang::Fr),
            Lang::Fr,
        ),
    }
}
