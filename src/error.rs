//! Error types for the command parser
//!
//! Validation problems and lexicon compilation failures are typed with
//! thiserror. None of them escape `parse_query`: the parser boundary turns
//! every `ParseError` into a "not understood" result carrying
//! `ParseError::user_message`.

use thiserror::Error;

use crate::types::Lang;

/// Input shape/size violations detected before any pattern runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' must be a string")]
    NotAString { field: String },

    #[error("Field '{field}' is too long ({len} chars, max {max})")]
    TooLong {
        field: String,
        len: usize,
        max: usize,
    },

    #[error("Field '{field}' has too many items ({len}, max {max})")]
    TooManyItems {
        field: String,
        len: usize,
        max: usize,
    },

    #[error("Invalid item {index} in '{field}': {reason}")]
    InvalidItem {
        field: String,
        index: usize,
        reason: String,
    },

    #[error("Field '{field}' has an invalid shape: {reason}")]
    InvalidShape { field: String, reason: String },

    #[error("Query is empty")]
    EmptyQuery,
}

/// Top-level parser error
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Pattern compilation failed: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Parser internal error: {message}")]
    Internal { message: String },
}

impl From<String> for ParseError {
    fn from(message: String) -> Self {
        ParseError::Internal { message }
    }
}

impl ParseError {
    /// Localized clarification shown to the user in place of a result
    pub fn user_message(&self, lang: Lang) -> String {
        match (self, lang) {
            (ParseError::Validation(ValidationError::EmptyQuery), Lang::Fr) => {
                "Je n'ai rien reçu. Que veux-tu faire sur tes projets ?".to_string()
            }
            (ParseError::Validation(ValidationError::EmptyQuery), Lang::En) => {
                "I didn't get anything. What would you like to do with your projects?".to_string()
            }
            (ParseError::Validation(ValidationError::TooLong { max, .. }), Lang::Fr) => {
                format!("Ta demande est trop longue (maximum {} caractères).", max)
            }
            (ParseError::Validation(ValidationError::TooLong { max, .. }), Lang::En) => {
                format!("Your request is too long (maximum {} characters).", max)
            }
            (ParseError::Validation(_), Lang::Fr) => {
                "Je n'ai pas pu lire ta demande. Peux-tu la reformuler ?".to_string()
            }
            (ParseError::Validation(_), Lang::En) => {
                "I couldn't read your request. Could you rephrase it?".to_string()
            }
            (_, Lang::Fr) => {
                "Je n'ai pas compris ta demande. Peux-tu reformuler ?".to_string()
            }
            (_, Lang::En) => "I didn't understand your request. Could you rephrase?".to_string(),
        }
    }
}
