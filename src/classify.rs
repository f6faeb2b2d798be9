//! Command Classifier
//!
//! Decides what kind of command a folded query is. Priority when several
//! signals are present:
//!
//! ```text
//! meta question ─▶ conversational (filters are presumed false positives)
//! update > create > count > list/question > search > chit-chat
//! ```

use regex::Regex;
use tracing::debug;

use crate::error::ParseError;
use crate::lexicon::tables::{EN_MARKERS, FR_MARKERS, PULL_VERBS, PUSH_VERBS};
use crate::lexicon::{word_regex, Lexicon};
use crate::types::Lang;

/// Command category, before any payload is extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Question about the assistant itself
    Meta,
    /// Greeting or open chit-chat
    Conversational,
    Update,
    Create,
    Count,
    List,
    Search,
    Unknown,
}

impl Intent {
    pub fn is_conversational(&self) -> bool {
        matches!(self, Intent::Meta | Intent::Conversational)
    }
}

/// Classifier signals for one query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    pub lang: Lang,
    pub has_action_verb: bool,
    pub has_project_mention: bool,
    pub is_question: bool,
    pub is_meta_question: bool,
}

/// What the extractors already saw, fed back into classification
#[derive(Debug, Clone, Copy, Default)]
pub struct Signals {
    pub has_filters: bool,
    pub has_note: bool,
}

pub struct Classifier {
    fr_marker: Regex,
    en_marker: Regex,
    shift_verb: Regex,
}

impl Classifier {
    pub fn new() -> Result<Self, ParseError> {
        let shift_verbs: Vec<&str> = PUSH_VERBS.iter().chain(PULL_VERBS).copied().collect();
        Ok(Self {
            fr_marker: word_regex(FR_MARKERS)?,
            en_marker: word_regex(EN_MARKERS)?,
            shift_verb: word_regex(&shift_verbs)?,
        })
    }

    /// French unless English markers strictly outnumber French ones
    pub fn detect_lang(&self, text: &str) -> Lang {
        let fr = self.fr_marker.find_iter(text).count();
        let en = self.en_marker.find_iter(text).count();
        if en > fr {
            Lang::En
        } else {
            Lang::Fr
        }
    }

    pub fn classify(&self, lexicon: &Lexicon, text: &str, signals: Signals) -> Classification {
        let lang = self.detect_lang(text);
        let is_meta_question = lexicon.meta_phrase.is_match(text);
        let has_project_mention = lexicon.project_noun.is_match(text);
        let is_question = text.trim_end().ends_with('?') || lexicon.question_word.is_match(text);

        let create_at = lexicon.create_phrase.find(text).map(|m| m.start());
        // Update verbs after a create phrase describe the new project
        let update_at = lexicon
            .update_verb
            .find(text)
            .map(|m| m.start())
            .filter(|pos| create_at.map_or(true, |c| *pos < c));
        let deadline_shift = self.shift_verb.is_match(text) && lexicon.mentions_deadline(text);
        let has_action_verb = update_at.is_some() || deadline_shift || signals.has_note;

        let intent = if is_meta_question {
            Intent::Meta
        } else if has_action_verb {
            Intent::Update
        } else if create_at.is_some() {
            Intent::Create
        } else if lexicon.count_word.is_match(text) {
            Intent::Count
        } else if lexicon.list_verb.is_match(text) || (is_question && has_project_mention) {
            Intent::List
        } else if lexicon.search_verb.is_match(text) {
            Intent::Search
        } else if has_project_mention || signals.has_filters || lexicon.all_projects.is_match(text) {
            Intent::List
        } else if lexicon.greeting.is_match(text) || is_question {
            Intent::Conversational
        } else {
            Intent::Unknown
        };

        debug!(
            intent = ?intent,
            lang = ?lang,
            has_action_verb,
            has_project_mention,
            is_question,
            is_meta_question,
            "Query classified"
        );

        Classification {
            intent,
            lang,
            has_action_verb,
            has_project_mention,
            is_question,
            is_meta_question,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_text;

    fn classify(query: &str, signals: Signals) -> Classification {
        let lexicon = Lexicon::new().unwrap();
        Classifier::new()
            .unwrap()
            .classify(&lexicon, &normalize_text(query), signals)
    }

    fn intent(query: &str) -> Intent {
        classify(query, Signals::default()).intent
    }

    #[test]
    fn test_core_intents() {
        assert_eq!(intent("liste les projets terminés"), Intent::List);
        assert_eq!(intent("combien de projets en cours ?"), Intent::Count);
        assert_eq!(intent("passe les projets en cours en annulé"), Intent::Update);
        assert_eq!(intent("crée un projet Nuit Blanche"), Intent::Create);
        assert_eq!(intent("cherche Nuit Blanche"), Intent::Search);
        assert_eq!(intent("quels projets sont en attente ?"), Intent::List);
    }

    #[test]
    fn test_update_beats_list_and_create_keeps_its_verbs() {
        assert_eq!(intent("affiche puis passe les en terminé"), Intent::Update);
        assert_eq!(
            intent("crée un projet Aube et mets le style trap"),
            Intent::Create
        );
    }

    #[test]
    fn test_deadline_push_without_update_verb() {
        assert_eq!(intent("ajoute 2 semaines à leur deadline"), Intent::Update);
    }

    #[test]
    fn test_meta_question_wins_over_filters() {
        let c = classify(
            "qui es-tu et tu gères les projets terminés ?",
            Signals {
                has_filters: true,
                has_note: false,
            },
        );
        assert_eq!(c.intent, Intent::Meta);
        assert!(c.is_meta_question);
        assert!(c.intent.is_conversational());
    }

    #[test]
    fn test_chit_chat_and_unknown() {
        assert_eq!(intent("bonjour"), Intent::Conversational);
        assert_eq!(intent("comment ça va ?"), Intent::Conversational);
        assert_eq!(intent("banane"), Intent::Unknown);
    }

    #[test]
    fn test_lang_detection() {
        let classifier = Classifier::new().unwrap();
        assert_eq!(classifier.detect_lang("show me the projects with their deadline"), Lang::En);
        assert_eq!(classifier.detect_lang("liste les projets"), Lang::Fr);
        assert_eq!(classifier.detect_lang("ok"), Lang::Fr);
    }
}
