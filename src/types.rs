//! Parser data model
//!
//! `ParsedFilters` qualifies which projects a command looks at, `UpdateData`
//! and `CreateData` carry the requested mutation, and `ParseQueryResult`
//! wraps them behind `ParsedCommand` so a result can never hold both an
//! update and a create payload.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::lexicon::ProjectStatus;

// =============================================================================
// LANGUAGE
// =============================================================================

/// Language detected for a query; drives every user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Fr,
    En,
}

// =============================================================================
// FILTERS
// =============================================================================

/// Filters detected in a query.
///
/// A field is "present" when it holds a non-empty value; a filter whose fields
/// are all absent or empty strings is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_final: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_deadline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_progress: Option<bool>,
    /// Project name (search term or project mentioned by name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn text_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl ParsedFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field carries a usable value
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.min_progress.is_none()
            && self.max_progress.is_none()
            && !text_present(&self.collab)
            && !text_present(&self.style)
            && !text_present(&self.label)
            && !text_present(&self.label_final)
            && self.has_deadline.is_none()
            && self.deadline_date.is_none()
            && self.no_progress.is_none()
            && !text_present(&self.name)
    }

    /// Drop blank strings so they cannot count as present downstream
    pub fn compact(mut self) -> Self {
        for field in [
            &mut self.collab,
            &mut self.style,
            &mut self.label,
            &mut self.label_final,
            &mut self.name,
        ] {
            if !text_present(field) {
                *field = None;
            }
        }
        self
    }

    /// Field-by-field merge; values already set on `self` win
    pub fn merged_with(&self, other: &ParsedFilters) -> ParsedFilters {
        ParsedFilters {
            status: self.status.or(other.status),
            min_progress: self.min_progress.or(other.min_progress),
            max_progress: self.max_progress.or(other.max_progress),
            collab: self.collab.clone().or_else(|| other.collab.clone()),
            style: self.style.clone().or_else(|| other.style.clone()),
            label: self.label.clone().or_else(|| other.label.clone()),
            label_final: self
                .label_final
                .clone()
                .or_else(|| other.label_final.clone()),
            has_deadline: self.has_deadline.or(other.has_deadline),
            deadline_date: self.deadline_date.or(other.deadline_date),
            no_progress: self.no_progress.or(other.no_progress),
            name: self.name.clone().or_else(|| other.name.clone()),
        }
        .compact()
    }
}

/// Fields a user can ask to see alongside a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    Status,
    Progress,
    Deadline,
    Collab,
    Style,
    Label,
    LabelFinal,
    Note,
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// Relative deadline shift; years are folded into months
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadlineShift {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weeks: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months: Option<i32>,
}

/// Adds `amount` to `slot`; leaves it untouched and returns false on overflow
fn accumulate(slot: &mut Option<i32>, amount: i32) -> bool {
    match slot.unwrap_or(0).checked_add(amount) {
        Some(total) => {
            *slot = Some(total);
            true
        }
        None => false,
    }
}

impl DeadlineShift {
    pub fn add_days(&mut self, amount: i32) -> bool {
        accumulate(&mut self.days, amount)
    }

    pub fn add_weeks(&mut self, amount: i32) -> bool {
        accumulate(&mut self.weeks, amount)
    }

    pub fn add_months(&mut self, amount: i32) -> bool {
        accumulate(&mut self.months, amount)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_none() && self.weeks.is_none() && self.months.is_none()
    }

    pub fn negated(self) -> Self {
        Self {
            days: self.days.map(i32::saturating_neg),
            weeks: self.weeks.map(i32::saturating_neg),
            months: self.months.map(i32::saturating_neg),
        }
    }
}

/// Keeps `Some(None)` for an explicit JSON `null` (deadline removal)
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Requested update.
///
/// `criteria` is the copy of the filter fields that qualify which records to
/// touch; every `new_*` field is a target value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateData {
    #[serde(flatten)]
    pub criteria: ParsedFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_progress: Option<u8>,
    /// `Some(None)` deletes the deadline
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_some"
    )]
    pub new_deadline: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_deadline_by: Option<DeadlineShift>,
    /// Mutation qualifier: the record must already have a deadline.
    /// Never narrows the scope on its own.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_deadline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_collab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_label_final: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_note: Option<String>,
}

impl UpdateData {
    /// True when at least one target value is set
    pub fn has_mutation(&self) -> bool {
        self.new_status.is_some()
            || self.new_progress.is_some()
            || self.new_deadline.is_some()
            || self.push_deadline_by.is_some()
            || self.new_collab.is_some()
            || self.new_style.is_some()
            || self.new_label.is_some()
            || self.new_label_final.is_some()
            || self.new_note.is_some()
    }

    /// A note is the only thing being written
    pub fn is_note_only(&self) -> bool {
        self.new_note.is_some()
            && self.new_status.is_none()
            && self.new_progress.is_none()
            && self.new_deadline.is_none()
            && self.push_deadline_by.is_none()
            && self.new_collab.is_none()
            && self.new_style.is_none()
            && self.new_label.is_none()
            && self.new_label_final.is_none()
    }

    pub fn removes_deadline(&self) -> bool {
        matches!(self.new_deadline, Some(None))
    }

    /// Fields the confirmation card should display
    pub fn touched_fields(&self) -> Vec<FieldName> {
        let mut fields = Vec::new();
        if self.new_status.is_some() {
            fields.push(FieldName::Status);
        }
        if self.new_progress.is_some() {
            fields.push(FieldName::Progress);
        }
        if self.new_deadline.is_some() || self.push_deadline_by.is_some() {
            fields.push(FieldName::Deadline);
        }
        if self.new_collab.is_some() {
            fields.push(FieldName::Collab);
        }
        if self.new_style.is_some() {
            fields.push(FieldName::Style);
        }
        if self.new_label.is_some() {
            fields.push(FieldName::Label);
        }
        if self.new_label_final.is_some() {
            fields.push(FieldName::LabelFinal);
        }
        if self.new_note.is_some() {
            fields.push(FieldName::Note);
        }
        fields
    }
}

/// Requested project creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collab: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_final: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// =============================================================================
// RESULTS
// =============================================================================

/// Command category decided by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    List,
    Count,
    Update,
    Create,
    Search,
}

/// Command payload; the variant is the query type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParsedCommand {
    List,
    Count,
    Search,
    Create {
        #[serde(rename = "createData")]
        create_data: CreateData,
    },
    Update {
        #[serde(rename = "updateData")]
        update_data: UpdateData,
    },
}

impl ParsedCommand {
    pub fn query_type(&self) -> QueryType {
        match self {
            ParsedCommand::List => QueryType::List,
            ParsedCommand::Count => QueryType::Count,
            ParsedCommand::Search => QueryType::Search,
            ParsedCommand::Create { .. } => QueryType::Create,
            ParsedCommand::Update { .. } => QueryType::Update,
        }
    }
}

/// Output of `parse_query`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseQueryResult {
    pub filters: ParsedFilters,
    #[serde(flatten)]
    pub command: ParsedCommand,
    pub understood: bool,
    pub clarification: Option<String>,
    pub lang: Lang,
    pub is_conversational: bool,
    pub fields_to_show: Vec<FieldName>,
}

impl ParseQueryResult {
    /// Safe result used whenever parsing fails
    pub fn not_understood(clarification: impl Into<String>, lang: Lang) -> Self {
        Self {
            filters: ParsedFilters::default(),
            command: ParsedCommand::Search,
            understood: false,
            clarification: Some(clarification.into()),
            lang,
            is_conversational: false,
            fields_to_show: Vec::new(),
        }
    }

    /// Result routed to the conversational fallback
    pub fn conversational(lang: Lang) -> Self {
        Self {
            filters: ParsedFilters::default(),
            command: ParsedCommand::Search,
            understood: true,
            clarification: None,
            lang,
            is_conversational: true,
            fields_to_show: Vec::new(),
        }
    }

    pub fn query_type(&self) -> QueryType {
        self.command.query_type()
    }

    pub fn update_data(&self) -> Option<&UpdateData> {
        match &self.command {
            ParsedCommand::Update { update_data } => Some(update_data),
            _ => None,
        }
    }

    pub fn create_data(&self) -> Option<&CreateData> {
        match &self.command {
            ParsedCommand::Create { create_data } => Some(create_data),
            _ => None,
        }
    }
}

// =============================================================================
// CONVERSATION HISTORY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn of caller-supplied conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

impl HistoryMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_strings_are_empty_filters() {
        let filters = ParsedFilters {
            collab: Some("   ".into()),
            style: Some(String::new()),
            ..Default::default()
        };
        assert!(filters.is_empty());
        assert_eq!(filters.compact(), ParsedFilters::default());
    }

    #[test]
    fn test_false_flag_is_present() {
        let filters = ParsedFilters {
            has_deadline: Some(false),
            ..Default::default()
        };
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_merge_keeps_own_values() {
        let own = ParsedFilters {
            status: Some(ProjectStatus::Termine),
            ..Default::default()
        };
        let other = ParsedFilters {
            status: Some(ProjectStatus::Annule),
            collab: Some("Nina".into()),
            ..Default::default()
        };
        let merged = own.merged_with(&other);
        assert_eq!(merged.status, Some(ProjectStatus::Termine));
        assert_eq!(merged.collab.as_deref(), Some("Nina"));
    }

    #[test]
    fn test_deadline_removal_serializes_as_null() {
        let data = UpdateData {
            new_deadline: Some(None),
            requires_deadline: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value, json!({"newDeadline": null, "requiresDeadline": true}));

        let back: UpdateData = serde_json::from_value(value).unwrap();
        assert!(back.removes_deadline());

        let untouched: UpdateData = serde_json::from_value(json!({})).unwrap();
        assert_eq!(untouched.new_deadline, None);
    }

    #[test]
    fn test_result_carries_exactly_one_payload() {
        let result = ParseQueryResult {
            filters: ParsedFilters::default(),
            command: ParsedCommand::Update {
                update_data: UpdateData {
                    new_progress: Some(10),
                    ..Default::default()
                },
            },
            understood: true,
            clarification: None,
            lang: Lang::Fr,
            is_conversational: false,
            fields_to_show: vec![],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "update");
        assert_eq!(value["updateData"]["newProgress"], 10);
        assert!(value.get("createData").is_none());
        assert!(result.create_data().is_none());
    }

    #[test]
    fn test_shift_negation() {
        let mut shift = DeadlineShift::default();
        shift.add_months(1);
        shift.add_weeks(2);
        let negated = shift.negated();
        assert_eq!(negated.months, Some(-1));
        assert_eq!(negated.weeks, Some(-2));
        assert_eq!(negated.days, None);
    }

    #[test]
    fn test_shift_overflow_keeps_previous_total() {
        let mut shift = DeadlineShift::default();
        assert!(shift.add_days(2_000_000_000));
        assert!(!shift.add_days(2_000_000_000));
        assert_eq!(shift.days, Some(2_000_000_000));

        let extreme = DeadlineShift {
            months: Some(i32::MIN),
            ..Default::default()
        };
        assert_eq!(extreme.negated().months, Some(i32::MAX));
    }
}
