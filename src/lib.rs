//! pm-intent: deterministic French/English command parser for project
//! management.
//!
//! Free-form sentences ("passe les projets en cours en annulé", "met leur
//! deadline à dans 2 mois") become typed commands a data store can apply
//! after human confirmation. No language model is involved on this path.
//!
//! ```text
//! query ─▶ normalize ─▶ filters + classify ─▶ inference ─▶ extractors
//!                                                              │
//!                    memory ◀──▶ router (scope) ◀──────────────┘
//!                                   │
//!                   LIST | COUNT | SEARCH | CREATE | UPDATE | ADD_NOTE | GENERAL
//! ```
//!
//! Entry points: [`parse_query`] (stateless) and [`CommandRouter::route`]
//! (per-user conversation memory, scope resolution).

pub mod classify;
pub mod config;
pub mod conversational;
pub mod error;
pub mod extract;
pub mod inference;
pub mod lexicon;
pub mod memory;
pub mod messages;
pub mod normalize;
pub mod parser;
pub mod project;
pub mod router;
pub mod types;

pub use config::ParserConfig;
pub use conversational::{answer_general, CannedFallback, ConversationalFallback};
pub use error::{ParseError, ValidationError};
pub use lexicon::ProjectStatus;
pub use memory::{ConversationContext, ConversationMemory, ReferenceKind};
pub use parser::{parse_query, parse_query_value, ParseContext, ParseRequest, QueryParser};
pub use project::{DefaultProjectFilter, Project, ProjectFilter};
pub use router::{
    confirm_pending_action, route_project_command, CommandResult, CommandRouter,
    MutationExecutor, PendingConfirmationAction, RouteContext, ScopeSource,
};
pub use types::{
    CreateData, DeadlineShift, FieldName, HistoryMessage, Lang, ParseQueryResult, ParsedCommand,
    ParsedFilters, QueryType, Role, UpdateData,
};
