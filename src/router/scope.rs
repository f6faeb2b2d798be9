//! Scope resolution for updates.
//!
//! Decides which records an update touches, in priority order:
//!
//! ```text
//! explicit filter (or a live name)      ─▶ ExplicitFilter
//! "tous les projets"                    ─▶ AllProjects
//! working set from the last LIST        ─▶ LastListedIds
//! status inferred from the last turn    ─▶ ExplicitFilter
//! reference with no usable context      ─▶ clarification
//! nothing                               ─▶ AllProjects (with a warning)
//! ```
//!
//! The chosen `ScopeSource` travels with the pending action as-is.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lexicon::{Lexicon, ProjectStatus};
use crate::memory::{ContextLookup, ReferenceError, ReferenceKind};
use crate::messages;
use crate::normalize::{contains_word, normalize_text};
use crate::project::{Project, ProjectFilter};
use crate::types::{Lang, ParsedFilters};

/// Why a project set was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeSource {
    ExplicitFilter,
    LastListedIds,
    AllProjects,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    pub source: ScopeSource,
    pub projects: Vec<Project>,
    /// Filter applied for `ExplicitFilter`, empty otherwise
    pub filters: ParsedFilters,
    pub message: String,
}

/// What scope resolution looks at for one update
pub struct ScopeInput<'a> {
    pub folded_query: &'a str,
    pub filters: &'a ParsedFilters,
    pub criteria: &'a ParsedFilters,
    /// Status filled in by inference rather than typed
    pub inferred_status: Option<ProjectStatus>,
    pub projects: &'a [Project],
    /// Caller-supplied working set; takes precedence over memory
    pub last_listed_ids: Option<&'a [String]>,
    pub context: &'a ContextLookup,
    pub reference: Option<ReferenceKind>,
    pub all_projects_requested: bool,
    pub lexicon: &'a Lexicon,
    pub lang: Lang,
}

/// Longest live project name mentioned verbatim in the folded query.
///
/// Names that are plain command vocabulary ("Deadline", "En cours") never
/// count: the query uses those words for the command itself.
pub fn mentioned_project_name(
    folded_query: &str,
    projects: &[Project],
    lexicon: &Lexicon,
) -> Option<String> {
    projects
        .iter()
        .filter_map(|p| {
            let folded = normalize_text(&p.name);
            if folded.chars().count() < 3 || lexicon.is_vocabulary(&folded) {
                return None;
            }
            contains_word(folded_query, &folded).then(|| (folded.len(), p.name.clone()))
        })
        .max_by_key(|(len, _)| *len)
        .map(|(_, name)| name)
}

fn by_ids(projects: &[Project], ids: &[String]) -> Vec<Project> {
    ids.iter()
        .filter_map(|id| projects.iter().find(|p| &p.id == id).cloned())
        .collect()
}

pub fn resolve_scope(
    input: &ScopeInput<'_>,
    filter: &dyn ProjectFilter,
) -> Result<ResolvedScope, ReferenceError> {
    let lang = input.lang;

    let mut explicit = input.filters.merged_with(input.criteria);
    if input.inferred_status.is_some() && explicit.status == input.inferred_status {
        explicit.status = None;
    }
    if explicit.name.is_none() {
        explicit.name = mentioned_project_name(input.folded_query, input.projects, input.lexicon);
    }
    let explicit = explicit.compact();

    if !explicit.is_empty() {
        let projects = filter.filter_projects(input.projects, &explicit);
        debug!(count = projects.len(), "Scope from explicit filter");
        return Ok(ResolvedScope {
            source: ScopeSource::ExplicitFilter,
            message: if projects.is_empty() {
                messages::no_matching_projects(lang)
            } else {
                messages::explicit_scope(projects.len(), lang)
            },
            projects,
            filters: explicit,
        });
    }

    if input.all_projects_requested {
        return Ok(ResolvedScope {
            source: ScopeSource::AllProjects,
            projects: input.projects.to_vec(),
            filters: ParsedFilters::default(),
            message: messages::all_projects_explicit(input.projects.len(), lang),
        });
    }

    let stored_ids = match input.context {
        ContextLookup::Active(ctx) if ctx.has_working_set() => Some(ctx.last_project_ids.as_slice()),
        _ => None,
    };
    let working_set = input
        .last_listed_ids
        .filter(|ids| !ids.is_empty())
        .or(stored_ids);
    if let Some(ids) = working_set {
        let projects = by_ids(input.projects, ids);
        debug!(count = projects.len(), "Scope from working set");
        return Ok(ResolvedScope {
            source: ScopeSource::LastListedIds,
            message: messages::reference_confirmation(projects.len(), lang),
            projects,
            filters: ParsedFilters::default(),
        });
    }

    if let Some(status) = input.inferred_status {
        let filters = ParsedFilters {
            status: Some(status),
            ..Default::default()
        };
        let projects = filter.filter_projects(input.projects, &filters);
        return Ok(ResolvedScope {
            source: ScopeSource::ExplicitFilter,
            message: messages::explicit_scope(projects.len(), lang),
            projects,
            filters,
        });
    }

    if let Some(kind) = input.reference {
        return Err(match input.context {
            ContextLookup::Expired(_) => ReferenceError::ExpiredContext(kind),
            _ => ReferenceError::MissingContext(kind),
        });
    }

    Ok(ResolvedScope {
        source: ScopeSource::AllProjects,
        projects: input.projects.to_vec(),
        filters: ParsedFilters::default(),
        message: messages::all_projects_warning(input.projects.len(), lang),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ConversationContext;
    use crate::project::DefaultProjectFilter;
    use chrono::{TimeZone, Utc};
    use std::sync::LazyLock;

    static LEXICON: LazyLock<Lexicon> = LazyLock::new(|| Lexicon::new().unwrap());

    fn projects() -> Vec<Project> {
        vec![
            Project::new("1", "Nuit Blanche").with_status(ProjectStatus::EnCours),
            Project::new("2", "Aube").with_status(ProjectStatus::Termine),
            Project::new("3", "Été 85").with_status(ProjectStatus::EnCours),
        ]
    }

    fn input<'a>(
        filters: &'a ParsedFilters,
        projects: &'a [Project],
        ids: Option<&'a [String]>,
        context: &'a ContextLookup,
    ) -> ScopeInput<'a> {
        ScopeInput {
            folded_query: "met les a 80%",
            filters,
            criteria: filters,
            inferred_status: None,
            projects,
            last_listed_ids: ids,
            context,
            reference: Some(ReferenceKind::Pronoun),
            all_projects_requested: false,
            lexicon: &LEXICON,
            lang: Lang::Fr,
        }
    }

    #[test]
    fn test_working_set_when_no_filter() {
        let projects = projects();
        let ids = vec!["1".to_string()];
        let empty = ParsedFilters::default();
        let scope = resolve_scope(
            &input(&empty, &projects, Some(&ids), &ContextLookup::Missing),
            &DefaultProjectFilter,
        )
        .unwrap();
        assert_eq!(scope.source, ScopeSource::LastListedIds);
        assert_eq!(scope.projects.len(), 1);
        assert_eq!(scope.projects[0].id, "1");
    }

    #[test]
    fn test_explicit_filter_ignores_working_set() {
        let projects = projects();
        let ids = vec!["1".to_string()];
        let filters = ParsedFilters {
            status: Some(ProjectStatus::EnCours),
            ..Default::default()
        };
        let scope = resolve_scope(
            &input(&filters, &projects, Some(&ids), &ContextLookup::Missing),
            &DefaultProjectFilter,
        )
        .unwrap();
        assert_eq!(scope.source, ScopeSource::ExplicitFilter);
        let ids: Vec<_> = scope.projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_working_set_order_is_kept() {
        let projects = projects();
        let empty = ParsedFilters::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let mut ctx = ConversationContext::empty(now);
        ctx.last_project_ids = vec!["3".into(), "1".into()];
        let lookup = ContextLookup::Active(ctx);
        let scope = resolve_scope(&input(&empty, &projects, None, &lookup), &DefaultProjectFilter)
            .unwrap();
        let ids: Vec<_> = scope.projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[test]
    fn test_reference_without_context_asks() {
        let projects = projects();
        let empty = ParsedFilters::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let expired = ContextLookup::Expired(ConversationContext::empty(now));
        assert_eq!(
            resolve_scope(&input(&empty, &projects, None, &expired), &DefaultProjectFilter),
            Err(ReferenceError::ExpiredContext(ReferenceKind::Pronoun))
        );
        assert_eq!(
            resolve_scope(
                &input(&empty, &projects, None, &ContextLookup::Missing),
                &DefaultProjectFilter
            ),
            Err(ReferenceError::MissingContext(ReferenceKind::Pronoun))
        );
    }

    #[test]
    fn test_all_projects_fallback_warns() {
        let projects = projects();
        let empty = ParsedFilters::default();
        let mut scope_input = input(&empty, &projects, None, &ContextLookup::Missing);
        scope_input.reference = None;
        let scope = resolve_scope(&scope_input, &DefaultProjectFilter).unwrap();
        assert_eq!(scope.source, ScopeSource::AllProjects);
        assert_eq!(scope.projects.len(), 3);
        assert!(scope.message.contains("TOUS"));
    }

    #[test]
    fn test_all_projects_phrase_keeps_explicit_filter() {
        let projects = projects();
        let ids = vec!["2".to_string()];
        let filters = ParsedFilters {
            status: Some(ProjectStatus::EnCours),
            ..Default::default()
        };
        let mut scope_input = input(&filters, &projects, Some(&ids), &ContextLookup::Missing);
        scope_input.all_projects_requested = true;
        let scope = resolve_scope(&scope_input, &DefaultProjectFilter).unwrap();
        assert_eq!(scope.source, ScopeSource::ExplicitFilter);
        assert_eq!(scope.projects.len(), 2);

        // Without a filter the phrase beats the working set
        let empty = ParsedFilters::default();
        let mut scope_input = input(&empty, &projects, Some(&ids), &ContextLookup::Missing);
        scope_input.all_projects_requested = true;
        let scope = resolve_scope(&scope_input, &DefaultProjectFilter).unwrap();
        assert_eq!(scope.source, ScopeSource::AllProjects);
        assert_eq!(scope.projects.len(), 3);
    }

    #[test]
    fn test_live_name_is_an_explicit_filter() {
        let projects = projects();
        let empty = ParsedFilters::default();
        let mut scope_input = input(&empty, &projects, None, &ContextLookup::Missing);
        scope_input.folded_query = "passe nuit blanche en termine";
        let scope = resolve_scope(&scope_input, &DefaultProjectFilter).unwrap();
        assert_eq!(scope.source, ScopeSource::ExplicitFilter);
        assert_eq!(scope.projects.len(), 1);
        assert_eq!(scope.projects[0].id, "1");
    }

    #[test]
    fn test_vocabulary_name_does_not_hijack_working_set() {
        let mut projects = projects();
        projects.push(Project::new("4", "Deadline").with_status(ProjectStatus::EnCours));
        let ids = vec!["1".to_string(), "2".to_string()];
        let empty = ParsedFilters::default();
        let mut scope_input = input(&empty, &projects, Some(&ids), &ContextLookup::Missing);
        scope_input.folded_query = "met leur deadline a demain";
        let scope = resolve_scope(&scope_input, &DefaultProjectFilter).unwrap();
        assert_eq!(scope.source, ScopeSource::LastListedIds);
        assert_eq!(scope.projects.len(), 2);

        assert_eq!(
            mentioned_project_name("passe nuit blanche en termine", &projects, &LEXICON),
            Some("Nuit Blanche".to_string())
        );
        assert_eq!(mentioned_project_name("la deadline", &projects, &LEXICON), None);
    }
}
