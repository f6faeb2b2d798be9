//! Conversational Fallback
//!
//! Open-ended chit-chat and questions about the assistant itself go to an
//! external text generator. It only ever sees the user's prompt and the
//! project count; no parser state crosses this boundary.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::router::CommandResult;
use crate::types::Lang;

/// External free-text responder (typically a language model)
#[async_trait]
pub trait ConversationalFallback: Send + Sync {
    /// Answer a free-form prompt; `project_count` is the size of the user's catalog
    async fn respond(&self, prompt: &str, project_count: usize, lang: Lang) -> Result<String>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;
}

/// Fixed replies, used when no generator is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedFallback;

#[async_trait]
impl ConversationalFallback for CannedFallback {
    async fn respond(&self, _prompt: &str, project_count: usize, lang: Lang) -> Result<String> {
        Ok(match lang {
            Lang::Fr => format!(
                "Je suis ton assistant de gestion de projets. Tu as {} projet(s) : \
                 je peux les lister, les compter, les créer ou les modifier.",
                project_count
            ),
            Lang::En => format!(
                "I'm your project assistant. You have {} project(s): \
                 I can list, count, create or update them.",
                project_count
            ),
        })
    }

    fn provider_name(&self) -> &str {
        "canned"
    }
}

/// Answer a GENERAL result; every other result kind yields `None`
pub async fn answer_general(
    result: &CommandResult,
    fallback: &dyn ConversationalFallback,
) -> Result<Option<String>> {
    let CommandResult::General {
        prompt,
        project_count,
        lang,
    } = result
    else {
        return Ok(None);
    };

    debug!(provider = fallback.provider_name(), project_count, "Conversational fallback");
    let reply = fallback.respond(prompt, *project_count, *lang).await?;
    Ok(Some(reply))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoFallback;

    #[async_trait]
    impl ConversationalFallback for EchoFallback {
        async fn respond(&self, prompt: &str, project_count: usize, _lang: Lang) -> Result<String> {
            Ok(format!("{prompt}|{project_count}"))
        }

        fn provider_name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_general_results_reach_the_fallback() {
        let result = CommandResult::General {
            prompt: "qui es-tu ?".into(),
            project_count: 4,
            lang: Lang::Fr,
        };
        let reply = answer_general(&result, &EchoFallback).await.unwrap();
        assert_eq!(reply.as_deref(), Some("qui es-tu ?|4"));
    }

    #[tokio::test]
    async fn test_other_results_are_ignored() {
        let result = CommandResult::Clarify {
            message: "?".into(),
            lang: Lang::En,
        };
        assert_eq!(answer_general(&result, &CannedFallback).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_canned_reply_is_localized() {
        let reply = CannedFallback.respond("hello", 2, Lang::En).await.unwrap();
        assert!(reply.contains("You have 2 project(s)"));
    }
}
