//! Router scope resolution across turns, plus the confirmation hand-off.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};

use pm_intent::memory::{InMemoryContextStore, ManualClock};
use pm_intent::{
    confirm_pending_action, route_project_command, CommandResult, CommandRouter,
    ConversationMemory, DefaultProjectFilter, MutationExecutor, ParserConfig, Project,
    ProjectStatus, QueryParser, RouteContext, ScopeSource, UpdateData,
};

fn router() -> (CommandRouter, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap(),
    ));
    let memory = ConversationMemory::new(
        Arc::new(InMemoryContextStore::new()),
        clock.clone(),
        std::time::Duration::from_secs(300),
    );
    let parser = QueryParser::new(ParserConfig::default())
        .unwrap()
        .with_today(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    let router = CommandRouter::new(parser, memory, Arc::new(DefaultProjectFilter)).unwrap();
    (router, clock)
}

fn catalogue() -> Vec<Project> {
    vec![
        Project::new("1", "Nuit Blanche")
            .with_status(ProjectStatus::EnCours)
            .with_progress(40),
        Project::new("2", "Aube")
            .with_status(ProjectStatus::Termine)
            .with_deadline(NaiveDate::from_ymd_opt(2026, 4, 10).unwrap()),
        Project::new("3", "Été 85")
            .with_status(ProjectStatus::EnCours)
            .with_collab("Nina"),
    ]
}

fn context() -> RouteContext {
    RouteContext::new("user-42", catalogue())
}

fn ids(result: &CommandResult) -> Vec<String> {
    result
        .pending_action()
        .map(|a| a.affected_project_ids.clone())
        .unwrap_or_default()
}

fn source(result: &CommandResult) -> Option<ScopeSource> {
    result.pending_action().map(|a| a.scope_source)
}

#[test]
fn test_caller_working_set_wins_for_pronouns() {
    let mut ctx = context();
    ctx.last_listed_project_ids = Some(vec!["1".into()]);

    let result = route_project_command("met les à 80%", &ctx);
    assert_eq!(result.kind(), "UPDATE");
    assert_eq!(source(&result), Some(ScopeSource::LastListedIds));
    assert_eq!(ids(&result), vec!["1"]);
}

#[test]
fn test_explicit_filter_ignores_working_set() {
    let mut ctx = context();
    ctx.last_listed_project_ids = Some(vec!["2".into()]);

    let result = route_project_command("met les projets en cours à 80%", &ctx);
    assert_eq!(source(&result), Some(ScopeSource::ExplicitFilter));
    assert_eq!(ids(&result), vec!["1", "3"]);
    assert_eq!(
        result.pending_action().unwrap().mutation.new_progress,
        Some(80)
    );
}

#[test]
fn test_transition_source_status_is_the_scope() {
    let result = route_project_command("passe les projets en cours en terminé", &context());
    let action = result.pending_action().unwrap();
    assert_eq!(action.scope_source, ScopeSource::ExplicitFilter);
    assert_eq!(action.affected_project_ids, vec!["1", "3"]);
    assert_eq!(action.mutation.new_status, Some(ProjectStatus::Termine));
}

#[test]
fn test_note_routes_to_add_note() {
    let result = route_project_command(
        "ajoute une note aux projets terminés : mix à refaire",
        &context(),
    );
    assert_eq!(result.kind(), "ADD_NOTE");
    assert_eq!(ids(&result), vec!["2"]);
    assert_eq!(
        result.pending_action().unwrap().mutation.new_note.as_deref(),
        Some("mix à refaire")
    );
}

#[test]
fn test_all_projects_explicit_and_implicit() {
    let explicit = route_project_command("passe tous les projets en terminé", &context());
    assert_eq!(source(&explicit), Some(ScopeSource::AllProjects));
    assert_eq!(ids(&explicit), vec!["1", "2", "3"]);

    match route_project_command("passe en terminé", &context()) {
        CommandResult::Update { action, message, .. } => {
            assert_eq!(action.scope_source, ScopeSource::AllProjects);
            assert!(message.contains("TOUS"));
        }
        other => panic!("expected UPDATE, got {}", other.kind()),
    }
}

#[test]
fn test_all_projects_phrase_does_not_widen_a_filter() {
    let mut ctx = context();
    ctx.last_listed_project_ids = Some(vec!["2".into()]);

    let result = route_project_command("passe tous les projets en cours en terminé", &ctx);
    let action = result.pending_action().unwrap();
    assert_eq!(action.scope_source, ScopeSource::ExplicitFilter);
    assert_eq!(action.affected_project_ids, vec!["1", "3"]);
    assert_eq!(action.mutation.criteria.status, Some(ProjectStatus::EnCours));
    assert_eq!(action.mutation.new_status, Some(ProjectStatus::Termine));
}

#[test]
fn test_deadline_possession_scopes_but_pronoun_keeps_working_set() {
    let mut ctx = context();
    ctx.last_listed_project_ids = Some(vec!["1".into(), "2".into()]);

    let owners = route_project_command(
        "repousse la deadline des projets qui ont une deadline d'un mois",
        &ctx,
    );
    let action = owners.pending_action().unwrap();
    assert_eq!(action.scope_source, ScopeSource::ExplicitFilter);
    assert_eq!(action.affected_project_ids, vec!["2"]);
    assert_eq!(action.mutation.criteria.has_deadline, Some(true));

    let theirs = route_project_command("repousse leur deadline d'un mois", &ctx);
    let action = theirs.pending_action().unwrap();
    assert_eq!(action.scope_source, ScopeSource::LastListedIds);
    assert_eq!(action.affected_project_ids, vec!["1", "2"]);
    assert!(action.mutation.requires_deadline);
    assert_eq!(action.mutation.criteria.has_deadline, None);
}

#[test]
fn test_english_pronoun_update() {
    let mut ctx = context();
    ctx.last_listed_project_ids = Some(vec!["3".into(), "1".into()]);

    let result = route_project_command("set them to done", &ctx);
    assert_eq!(source(&result), Some(ScopeSource::LastListedIds));
    // Working-set order is kept
    assert_eq!(ids(&result), vec!["3", "1"]);
}

#[test]
fn test_pronoun_without_context_asks() {
    match route_project_command("met les à 80%", &context()) {
        CommandResult::Clarify { .. } => {}
        other => panic!("expected CLARIFY, got {}", other.kind()),
    }
}

#[test]
fn test_default_routing_keeps_no_memory_between_calls() {
    let ctx = context();
    assert_eq!(route_project_command("liste les projets en cours", &ctx).kind(), "LIST");
    assert_eq!(route_project_command("met les à 80%", &ctx).kind(), "CLARIFY");
}

#[test]
fn test_memory_follows_the_conversation() {
    let (router, clock) = router();
    let ctx = context();

    let listed = router.route("liste les projets en cours", &ctx);
    assert_eq!(listed.kind(), "LIST");
    let stored = router.memory().get_context("user-42").unwrap();
    assert_eq!(stored.last_project_ids, vec!["1", "3"]);

    clock.advance(Duration::seconds(120));
    let result = router.route("mets leur deadline au 15 mars", &ctx);
    assert_eq!(source(&result), Some(ScopeSource::LastListedIds));
    assert_eq!(ids(&result), vec!["1", "3"]);
    assert_eq!(
        result.pending_action().unwrap().mutation.new_deadline,
        Some(Some(NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()))
    );

    // Another user has no working set
    let other = RouteContext::new("user-7", catalogue());
    assert_eq!(router.route("met les à 80%", &other).kind(), "CLARIFY");
}

#[test]
fn test_read_only_commands() {
    let (router, _) = router();
    let ctx = context();

    match router.route("combien de projets en cours ?", &ctx) {
        CommandResult::Count { count, .. } => assert_eq!(count, 2),
        other => panic!("expected COUNT, got {}", other.kind()),
    }

    match router.route("Crée un projet Minuit avec Nina", &ctx) {
        CommandResult::Create { create_data, .. } => {
            assert_eq!(create_data.name.as_deref(), Some("Minuit"));
        }
        other => panic!("expected CREATE, got {}", other.kind()),
    }

    assert_eq!(router.route("salut", &ctx).kind(), "GENERAL");
}

#[derive(Default)]
struct RecordingStore {
    applied: Mutex<Vec<(Vec<String>, UpdateData)>>,
}

#[async_trait]
impl MutationExecutor for RecordingStore {
    async fn apply(&self, project_ids: &[String], mutation: &UpdateData) -> Result<usize> {
        self.applied
            .lock()
            .unwrap()
            .push((project_ids.to_vec(), mutation.clone()));
        Ok(project_ids.len())
    }
}

#[tokio::test]
async fn test_confirmed_deadline_push_skips_projects_without_deadline() {
    let mut ctx = context();
    ctx.last_listed_project_ids = Some(vec!["1".into(), "2".into()]);

    let result = route_project_command("pousse leur deadline d'un mois", &ctx);
    let action = result.pending_action().unwrap();
    assert_eq!(action.affected_project_ids, vec!["1", "2"]);

    let store = RecordingStore::default();
    let outcome = confirm_pending_action(action, &store).await.unwrap();
    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.scope_source, ScopeSource::LastListedIds);

    let applied = store.applied.lock().unwrap();
    assert_eq!(applied[0].0, vec!["2"]);
    assert_eq!(applied[0].1.push_deadline_by.unwrap().months, Some(1));
}
