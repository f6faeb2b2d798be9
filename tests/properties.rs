//! Property tests for normalization, status transitions and context expiry.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use pm_intent::memory::ConversationContext;
use pm_intent::normalize::{normalize_text, strip_quotes};
use pm_intent::{parse_query, Lang, ProjectStatus, QueryType};

// -- Strategy helpers --

fn arb_status() -> impl Strategy<Value = ProjectStatus> {
    prop::sample::select(ProjectStatus::ALL.to_vec())
}

fn arb_status_pair() -> impl Strategy<Value = (ProjectStatus, ProjectStatus)> {
    (arb_status(), arb_status()).prop_filter("distinct statuses", |(a, b)| a != b)
}

/// "passe les projets <A> en <B>", dropping the joiner when B already
/// starts with "en"
fn transition_sentence(from: ProjectStatus, to: ProjectStatus) -> String {
    let target = to.label(Lang::Fr);
    if target.starts_with("en ") {
        format!("passe les projets {} {}", from.label(Lang::Fr), target)
    } else {
        format!("passe les projets {} en {}", from.label(Lang::Fr), target)
    }
}

proptest! {
    #[test]
    fn normalize_is_idempotent(s in "[a-zA-Z0-9 éèêàâçùôÉÈÀÇ'’«».,:?!-]{0,40}") {
        let once = normalize_text(&s);
        let twice = normalize_text(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalize_output_is_lowercase_single_spaced(s in "[a-zA-ZéÉàÀ \t]{0,40}") {
        let folded = normalize_text(&s);
        prop_assert!(!folded.contains("  "));
        prop_assert!(!folded.starts_with(' ') && !folded.ends_with(' '));
        prop_assert!(folded.chars().all(|c| c == ' ' || c.is_ascii_lowercase()));
    }

    #[test]
    fn quotes_are_stripped_once_per_side(s in "[a-zA-Z0-9 ]{0,30}") {
        let plain = format!("\"{}\"", s);
        prop_assert_eq!(strip_quotes(&plain), s.trim());

        let guillemets = format!("« {} »", s);
        prop_assert_eq!(strip_quotes(&guillemets), s.trim());

        let leading_only = format!("\"{}", s);
        prop_assert_eq!(strip_quotes(&leading_only), strip_quotes(&plain));
    }

    /// Every ordered pair of distinct statuses reads as "A becomes B"
    #[test]
    fn status_transitions_split_source_and_target((from, to) in arb_status_pair()) {
        let sentence = transition_sentence(from, to);
        let result = parse_query(&sentence, &[], &[], None, None);
        prop_assert_eq!(result.query_type(), QueryType::Update);

        let data = result.update_data().unwrap();
        prop_assert_eq!(data.criteria.status, Some(from), "{}", sentence);
        prop_assert_eq!(data.new_status, Some(to), "{}", sentence);
        prop_assert_ne!(result.filters.status, Some(to));
    }

    #[test]
    fn progress_target_round_trips(value in 0u8..=100) {
        let result = parse_query(&format!("met les à {}%", value), &[], &[], None, None);
        let data = result.update_data().unwrap();
        prop_assert_eq!(data.new_progress, Some(value));
        prop_assert_eq!(result.filters.min_progress, None);
    }

    #[test]
    fn context_expires_strictly_after_ttl(elapsed_ms in 0i64..600_000) {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let ctx = ConversationContext::empty(start);
        let now = start + Duration::milliseconds(elapsed_ms);
        prop_assert_eq!(
            ctx.is_expired(now, Duration::milliseconds(300_000)),
            elapsed_ms > 300_000
        );
    }
}
