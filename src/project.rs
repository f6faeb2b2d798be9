//! Project records and the data-store filter collaborator.
//!
//! The router never decides on its own which records satisfy a filter; it
//! asks a `ProjectFilter`. `DefaultProjectFilter` is the in-process version
//! used by tests and the CLI.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::lexicon::ProjectStatus;
use crate::normalize::normalize_text;
use crate::types::ParsedFilters;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collab: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_final: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: None,
            progress: None,
            deadline: None,
            collab: None,
            style: None,
            label: None,
            label_final: None,
            note: None,
        }
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_collab(mut self, collab: impl Into<String>) -> Self {
        self.collab = Some(collab.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// Data-store collaborator: which records satisfy a filter
pub trait ProjectFilter: Send + Sync {
    fn filter_projects(&self, projects: &[Project], filters: &ParsedFilters) -> Vec<Project>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProjectFilter;

/// Accent- and case-insensitive containment
fn text_matches(value: &Option<String>, wanted: &Option<String>) -> bool {
    match wanted.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
        None => true,
        Some(wanted) => value
            .as_deref()
            .is_some_and(|v| normalize_text(v).contains(&normalize_text(wanted))),
    }
}

impl DefaultProjectFilter {
    pub fn matches(&self, project: &Project, filters: &ParsedFilters) -> bool {
        let progress = project.progress.unwrap_or(0);

        filters.status.map_or(true, |s| project.status == Some(s))
            && filters.min_progress.map_or(true, |min| progress >= min)
            && filters.max_progress.map_or(true, |max| progress <= max)
            && filters
                .has_deadline
                .map_or(true, |wanted| project.deadline.is_some() == wanted)
            && filters
                .deadline_date
                .map_or(true, |date| project.deadline.is_some_and(|d| d <= date))
            && filters
                .no_progress
                .map_or(true, |wanted| (progress == 0) == wanted)
            && text_matches(&project.collab, &filters.collab)
            && text_matches(&project.style, &filters.style)
            && text_matches(&project.label, &filters.label)
            && text_matches(&project.label_final, &filters.label_final)
            && text_matches(&Some(project.name.clone()), &filters.name)
    }
}

impl ProjectFilter for DefaultProjectFilter {
    fn filter_projects(&self, projects: &[Project], filters: &ParsedFilters) -> Vec<Project> {
        projects
            .iter()
            .filter(|p| self.matches(p, filters))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projects() -> Vec<Project> {
        vec![
            Project::new("1", "Nuit Blanche")
                .with_status(ProjectStatus::EnCours)
                .with_progress(40)
                .with_collab("Nina"),
            Project::new("2", "Été 85")
                .with_status(ProjectStatus::Termine)
                .with_progress(100)
                .with_deadline(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()),
            Project::new("3", "Aube").with_style("Trap"),
        ]
    }

    fn ids(found: Vec<Project>) -> Vec<String> {
        found.into_iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_status_and_progress_filters() {
        let filter = DefaultProjectFilter;
        let filters = ParsedFilters {
            min_progress: Some(50),
            ..Default::default()
        };
        assert_eq!(ids(filter.filter_projects(&projects(), &filters)), vec!["2"]);

        let filters = ParsedFilters {
            status: Some(ProjectStatus::EnCours),
            ..Default::default()
        };
        assert_eq!(ids(filter.filter_projects(&projects(), &filters)), vec!["1"]);
    }

    #[test]
    fn test_text_filters_fold_accents() {
        let filters = ParsedFilters {
            name: Some("ete".into()),
            ..Default::default()
        };
        assert_eq!(ids(DefaultProjectFilter.filter_projects(&projects(), &filters)), vec!["2"]);

        let filters = ParsedFilters {
            no_progress: Some(true),
            ..Default::default()
        };
        assert_eq!(ids(DefaultProjectFilter.filter_projects(&projects(), &filters)), vec!["3"]);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        assert_eq!(
            DefaultProjectFilter
                .filter_projects(&projects(), &ParsedFilters::default())
                .len(),
            3
        );
    }
}
