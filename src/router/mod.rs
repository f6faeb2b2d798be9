//! Command Router
//!
//! Composes parsing, conversation memory and scope resolution into one
//! [`CommandResult`]. Updates come back as a [`PendingConfirmationAction`],
//! never as an applied change. The conversational path gets the raw prompt
//! only; no extractor runs for it.

pub mod confirm;
pub mod scope;

use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use confirm::{confirm_pending_action, ConfirmationOutcome, MutationExecutor, PendingConfirmationAction};
pub use scope::{mentioned_project_name, resolve_scope, ResolvedScope, ScopeInput, ScopeSource};

use crate::config::ParserConfig;
use crate::error::ParseError;
use crate::memory::{
    ActionType, ContextLookup, ContextUpdate, ConversationMemory, ReferenceDetector,
};
use crate::messages;
use crate::parser::{ParseContext, ParseDetails, QueryParser};
use crate::project::{DefaultProjectFilter, Project, ProjectFilter};
use crate::types::{
    CreateData, FieldName, HistoryMessage, Lang, ParsedCommand, ParsedFilters, UpdateData,
};

/// Router output; the variant is the command kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum CommandResult {
    List {
        projects: Vec<Project>,
        filters: ParsedFilters,
        fields_to_show: Vec<FieldName>,
        message: String,
        lang: Lang,
    },
    Search {
        projects: Vec<Project>,
        filters: ParsedFilters,
        message: String,
        lang: Lang,
    },
    Count {
        count: usize,
        filters: ParsedFilters,
        message: String,
        lang: Lang,
    },
    Create {
        create_data: CreateData,
        message: String,
        lang: Lang,
    },
    Update {
        action: PendingConfirmationAction,
        message: String,
        lang: Lang,
    },
    AddNote {
        action: PendingConfirmationAction,
        message: String,
        lang: Lang,
    },
    /// Conversational fallback; read-only
    General {
        prompt: String,
        project_count: usize,
        lang: Lang,
    },
    Clarify {
        message: String,
        lang: Lang,
    },
}

impl CommandResult {
    pub fn kind(&self) -> &'static str {
        match self {
            CommandResult::List { .. } => "LIST",
            CommandResult::Search { .. } => "SEARCH",
            CommandResult::Count { .. } => "COUNT",
            CommandResult::Create { .. } => "CREATE",
            CommandResult::Update { .. } => "UPDATE",
            CommandResult::AddNote { .. } => "ADD_NOTE",
            CommandResult::General { .. } => "GENERAL",
            CommandResult::Clarify { .. } => "CLARIFY",
        }
    }

    /// Pending action for UPDATE and ADD_NOTE
    pub fn pending_action(&self) -> Option<&PendingConfirmationAction> {
        match self {
            CommandResult::Update { action, .. } | CommandResult::AddNote { action, .. } => {
                Some(action)
            }
            _ => None,
        }
    }
}

/// Caller-side state for one routing call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteContext {
    pub user_id: String,
    pub projects: Vec<Project>,
    pub available_collabs: Vec<String>,
    pub available_styles: Vec<String>,
    /// Working set kept by the caller; overrides memory when non-empty
    pub last_listed_project_ids: Option<Vec<String>>,
    pub last_applied_filter: Option<ParsedFilters>,
    pub conversation_history: Vec<HistoryMessage>,
}

impl RouteContext {
    pub fn new(user_id: impl Into<String>, projects: Vec<Project>) -> Self {
        Self {
            user_id: user_id.into(),
            projects,
            ..Default::default()
        }
    }
}

pub struct CommandRouter {
    parser: Arc<QueryParser>,
    memory: ConversationMemory,
    filter: Arc<dyn ProjectFilter>,
    references: Arc<ReferenceDetector>,
}

impl CommandRouter {
    pub fn new(
        parser: QueryParser,
        memory: ConversationMemory,
        filter: Arc<dyn ProjectFilter>,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            parser: Arc::new(parser),
            memory,
            filter,
            references: Arc::new(ReferenceDetector::new()?),
        })
    }

    /// In-memory context store, system clock, default project filter
    pub fn with_config(config: ParserConfig) -> Result<Self, ParseError> {
        let ttl = config.context_ttl();
        Self::new(
            QueryParser::new(config)?,
            ConversationMemory::in_memory(ttl),
            Arc::new(DefaultProjectFilter),
        )
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    pub fn route(&self, query: &str, ctx: &RouteContext) -> CommandResult {
        let lookup = self.memory.lookup(&ctx.user_id);
        let remembered_filters = match &lookup {
            ContextLookup::Active(stored) => stored.last_filters.clone(),
            _ => None,
        };
        let last_filters = ctx.last_applied_filter.clone().or(remembered_filters);

        let details = self.parser.parse_detailed(
            query,
            &ParseContext {
                available_collabs: &ctx.available_collabs,
                available_styles: &ctx.available_styles,
                history: &ctx.conversation_history,
                last_filters: last_filters.as_ref(),
            },
        );

        let result = self.dispatch(query, ctx, &details, &lookup);
        info!(
            user_id = %ctx.user_id,
            kind = result.kind(),
            scope_source = ?result.pending_action().map(|a| a.scope_source),
            "Command routed"
        );
        result
    }

    fn dispatch(
        &self,
        query: &str,
        ctx: &RouteContext,
        details: &ParseDetails,
        lookup: &ContextLookup,
    ) -> CommandResult {
        let parsed = &details.result;
        let lang = parsed.lang;

        if parsed.is_conversational {
            return CommandResult::General {
                prompt: query.to_string(),
                project_count: ctx.projects.len(),
                lang,
            };
        }
        if !parsed.understood {
            return CommandResult::Clarify {
                message: parsed
                    .clarification
                    .clone()
                    .unwrap_or_else(|| messages::not_understood(lang)),
                lang,
            };
        }

        match &parsed.command {
            ParsedCommand::List => {
                let projects = self.filter.filter_projects(&ctx.projects, &parsed.filters);
                self.memory.record_list(
                    &ctx.user_id,
                    projects.iter().map(|p| p.id.clone()).collect(),
                    projects.iter().map(|p| p.name.clone()).collect(),
                    parsed.filters.clone(),
                );
                CommandResult::List {
                    message: messages::list_summary(projects.len(), lang),
                    projects,
                    filters: parsed.filters.clone(),
                    fields_to_show: parsed.fields_to_show.clone(),
                    lang,
                }
            }
            ParsedCommand::Count => {
                let count = self
                    .filter
                    .filter_projects(&ctx.projects, &parsed.filters)
                    .len();
                self.remember(ctx, ActionType::Count, Some(parsed.filters.clone()));
                CommandResult::Count {
                    count,
                    filters: parsed.filters.clone(),
                    message: messages::count_summary(count, lang),
                    lang,
                }
            }
            ParsedCommand::Search => {
                let projects = self.filter.filter_projects(&ctx.projects, &parsed.filters);
                self.remember(ctx, ActionType::Search, None);
                CommandResult::Search {
                    message: if projects.is_empty() {
                        messages::no_matching_projects(lang)
                    } else {
                        messages::list_summary(projects.len(), lang)
                    },
                    projects,
                    filters: parsed.filters.clone(),
                    lang,
                }
            }
            ParsedCommand::Create { create_data } => match &create_data.name {
                Some(name) if parsed.clarification.is_none() => {
                    self.remember(ctx, ActionType::Create, None);
                    CommandResult::Create {
                        message: messages::create_summary(name, lang),
                        create_data: create_data.clone(),
                        lang,
                    }
                }
                _ => CommandResult::Clarify {
                    message: parsed
                        .clarification
                        .clone()
                        .unwrap_or_else(|| messages::create_missing_name(lang)),
                    lang,
                },
            },
            ParsedCommand::Update { update_data } => {
                self.route_update(ctx, details, update_data, lookup)
            }
        }
    }

    fn route_update(
        &self,
        ctx: &RouteContext,
        details: &ParseDetails,
        update_data: &UpdateData,
        lookup: &ContextLookup,
    ) -> CommandResult {
        let parsed = &details.result;
        let lang = parsed.lang;
        let lexicon = self.parser.lexicon();

        let input = ScopeInput {
            folded_query: &details.folded,
            filters: &parsed.filters,
            criteria: &update_data.criteria,
            inferred_status: details.inferred.map(|i| i.status),
            projects: &ctx.projects,
            last_listed_ids: ctx.last_listed_project_ids.as_deref(),
            context: lookup,
            reference: self.references.detect(&details.folded),
            all_projects_requested: lexicon.all_projects.is_match(&details.folded),
            lexicon,
            lang,
        };

        let scope = match resolve_scope(&input, self.filter.as_ref()) {
            Ok(scope) => scope,
            Err(e) => {
                return CommandResult::Clarify {
                    message: e.user_message(lang),
                    lang,
                }
            }
        };

        self.remember(ctx, ActionType::Update, None);

        let note_only = update_data.is_note_only();
        let scope_message = scope.message.clone();
        let action =
            PendingConfirmationAction::new(scope, update_data.clone(), parsed.fields_to_show.clone());

        if note_only {
            let message = format!(
                "{} {}",
                scope_message,
                messages::note_confirmation(action.affected_project_ids.len(), lang)
            );
            CommandResult::AddNote {
                action,
                message,
                lang,
            }
        } else {
            let message = format!(
                "{} : {}",
                scope_message,
                messages::describe_mutation(&action.mutation, lang)
            );
            CommandResult::Update {
                action,
                message,
                lang,
            }
        }
    }

    fn remember(&self, ctx: &RouteContext, action: ActionType, filters: Option<ParsedFilters>) {
        self.memory.update_context(
            &ctx.user_id,
            ContextUpdate {
                filters,
                action_type: Some(action),
                ..Default::default()
            },
        );
    }
}

/// Compiled pieces shared by every [`route_project_command`] call
struct DefaultRouting {
    parser: Arc<QueryParser>,
    references: Arc<ReferenceDetector>,
}

static DEFAULT_ROUTING: LazyLock<Result<DefaultRouting, String>> = LazyLock::new(|| {
    Ok(DefaultRouting {
        parser: Arc::new(QueryParser::new(ParserConfig::default()).map_err(|e| e.to_string())?),
        references: Arc::new(ReferenceDetector::new().map_err(|e| e.to_string())?),
    })
});

/// Route with a default router. Memory lives only for the call; long-lived
/// callers keep their own [`CommandRouter`].
pub fn route_project_command(query: &str, ctx: &RouteContext) -> CommandResult {
    match DEFAULT_ROUTING.as_ref() {
        Ok(shared) => CommandRouter {
            parser: Arc::clone(&shared.parser),
            memory: ConversationMemory::in_memory(shared.parser.config().context_ttl()),
            filter: Arc::new(DefaultProjectFilter),
            references: Arc::clone(&shared.references),
        }
        .route(query, ctx),
        Err(message) => {
            let error = ParseError::Internal {
                message: message.clone(),
            };
            warn!(error = %error, "Default router unavailable");
            CommandResult::Clarify {
                message: error.user_message(Lang::Fr),
                lang: Lang::Fr,
            }
        }
    }
}
