//! Parser Configuration
//!
//! Input ceilings, context TTL and the typo pre-pass switch. Loaded from YAML
//! or from `PM_INTENT_*` environment variables; anything unset keeps its
//! default.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ValidationError;

/// Parser and router tuning knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum query length in characters
    pub max_query_len: usize,
    /// Maximum entries in `availableCollabs` / `availableStyles`
    pub max_list_items: usize,
    /// Maximum length of one list entry or filter value
    pub max_item_len: usize,
    /// Maximum conversation history entries accepted
    pub max_history: usize,
    /// User messages scanned by status inference, most recent first
    pub history_scan_depth: usize,
    /// Conversation context lifetime
    pub context_ttl_secs: u64,
    /// Enable the edit-distance pre-pass over lexicon vocabulary
    pub typo_tolerance: bool,
    /// Maximum Levenshtein distance accepted by the pre-pass
    pub typo_max_distance: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_query_len: 10_000,
            max_list_items: 500,
            max_item_len: 200,
            max_history: 100,
            history_scan_depth: 3,
            context_ttl_secs: 300,
            typo_tolerance: false,
            typo_max_distance: 1,
        }
    }
}

impl ParserConfig {
    pub fn context_ttl(&self) -> Duration {
        Duration::from_secs(self.context_ttl_secs)
    }

    /// Load from a YAML document; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: ParserConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Defaults overridden by `PM_INTENT_*` environment variables
    ///
    /// Recognized: `PM_INTENT_MAX_QUERY_LEN`, `PM_INTENT_MAX_LIST_ITEMS`,
    /// `PM_INTENT_MAX_ITEM_LEN`, `PM_INTENT_MAX_HISTORY`,
    /// `PM_INTENT_HISTORY_SCAN_DEPTH`, `PM_INTENT_CONTEXT_TTL_SECS`,
    /// `PM_INTENT_TYPO_TOLERANCE`, `PM_INTENT_TYPO_MAX_DISTANCE`
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ValidationError> {
        let mut config = Self::default();

        let number = |key: &str, current: usize| -> Result<usize, ValidationError> {
            match lookup(key) {
                Some(raw) => raw.trim().parse().map_err(|_| ValidationError::InvalidShape {
                    field: key.to_string(),
                    reason: format!("expected an unsigned integer, got '{}'", raw),
                }),
                None => Ok(current),
            }
        };

        config.max_query_len = number("PM_INTENT_MAX_QUERY_LEN", config.max_query_len)?;
        config.max_list_items = number("PM_INTENT_MAX_LIST_ITEMS", config.max_list_items)?;
        config.max_item_len = number("PM_INTENT_MAX_ITEM_LEN", config.max_item_len)?;
        config.max_history = number("PM_INTENT_MAX_HISTORY", config.max_history)?;
        config.history_scan_depth =
            number("PM_INTENT_HISTORY_SCAN_DEPTH", config.history_scan_depth)?;
        config.context_ttl_secs =
            number("PM_INTENT_CONTEXT_TTL_SECS", config.context_ttl_secs as usize)? as u64;
        config.typo_max_distance =
            number("PM_INTENT_TYPO_MAX_DISTANCE", config.typo_max_distance)?;

        if let Some(raw) = lookup("PM_INTENT_TYPO_TOLERANCE") {
            config.typo_tolerance = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ValidationError::InvalidShape {
                        field: "PM_INTENT_TYPO_TOLERANCE".into(),
                        reason: format!("expected a boolean, got '{}'", raw),
                    })
                }
            };
        }

        Ok(config)
    }
}
