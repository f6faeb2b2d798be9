//! Lexical dictionary.
//!
//! Pure data (`tables`) plus the combinators every extractor uses to turn a
//! table into a regex. Patterns always run on folded text (see
//! `normalize`), so tables hold folded words only.
//!
//! ```text
//! tables ──build_alternation──▶ "(?:w1|w2|...)" ──word_regex──▶ \b(?:...)\b
//! ```

pub mod status;
pub mod tables;
pub mod typo;

use regex::Regex;

use crate::error::ParseError;

pub use status::{ParseStatusError, ProjectStatus, StatusMatcher, StatusMention};
pub use tables::{FieldKind, TimeUnit};

/// Build a regex alternation from a word list.
///
/// Returns `""` for no words, the escaped word itself for one word and
/// `(?:w1|w2|...)` otherwise. Longer words come first so the leftmost-first
/// regex semantics pick the most specific phrase.
pub fn build_alternation(words: &[&str]) -> String {
    let mut escaped: Vec<String> = words
        .iter()
        .filter(|w| !w.is_empty())
        .map(|w| regex::escape(w))
        .collect();
    escaped.sort_by(|a, b| b.len().cmp(&a.len()));
    escaped.dedup();

    match escaped.len() {
        0 => String::new(),
        1 => escaped.remove(0),
        _ => format!("(?:{})", escaped.join("|")),
    }
}

/// Word-bounded regex source for a table
pub fn word_pattern(words: &[&str]) -> String {
    format!(r"\b{}\b", build_alternation(words))
}

/// Compile a word-bounded regex for a table
pub fn word_regex(words: &[&str]) -> Result<Regex, ParseError> {
    Ok(Regex::new(&word_pattern(words))?)
}

/// Regexes shared by the classifier and the extractors
pub struct Lexicon {
    pub status: StatusMatcher,
    pub update_verb: Regex,
    pub list_verb: Regex,
    pub count_word: Regex,
    pub search_verb: Regex,
    pub project_noun: Regex,
    pub deadline_noun: Regex,
    pub progress_noun: Regex,
    pub all_projects: Regex,
    pub question_word: Regex,
    pub greeting: Regex,
    pub meta_phrase: Regex,
    /// Create verb followed by an optional determiner and a project noun
    pub create_phrase: Regex,
}

impl Lexicon {
    pub fn new() -> Result<Self, ParseError> {
        use tables::*;

        let create_phrase = Regex::new(&format!(
            r"\b{}\b(?:\s+(?:un|une|a|an|the|le|la|mon|ma|my))?(?:\s+(?:nouveau|nouvelle|new))?\s+{}\b|\b(?:nouveau|nouvelle|new)\s+{}\b",
            build_alternation(CREATE_VERBS),
            build_alternation(PROJECT_NOUNS),
            build_alternation(PROJECT_NOUNS),
        ))?;

        Ok(Self {
            status: StatusMatcher::new()?,
            update_verb: word_regex(UPDATE_VERBS)?,
            list_verb: word_regex(LIST_VERBS)?,
            count_word: word_regex(COUNT_WORDS)?,
            search_verb: word_regex(SEARCH_VERBS)?,
            project_noun: word_regex(PROJECT_NOUNS)?,
            deadline_noun: word_regex(DEADLINE_NOUNS)?,
            progress_noun: word_regex(PROGRESS_NOUNS)?,
            all_projects: word_regex(ALL_PROJECTS_PHRASES)?,
            question_word: Regex::new(&format!(r"^{}\b", build_alternation(QUESTION_WORDS)))?,
            greeting: Regex::new(&format!(r"^{}\b", build_alternation(GREETINGS)))?,
            meta_phrase: word_regex(META_PHRASES)?,
            create_phrase,
        })
    }

    pub fn has_update_verb(&self, text: &str) -> bool {
        self.update_verb.is_match(text)
    }

    /// Byte offset right after the first update verb
    pub fn update_verb_end(&self, text: &str) -> Option<usize> {
        self.update_verb.find(text).map(|m| m.end())
    }

    pub fn mentions_deadline(&self, text: &str) -> bool {
        self.deadline_noun.is_match(text)
    }

    pub fn mentions_progress(&self, text: &str) -> bool {
        self.progress_noun.is_match(text)
    }

    /// Whether the whole of `folded` is command vocabulary: a status, a verb
    /// or one of the nouns the extractors key on
    pub fn is_vocabulary(&self, folded: &str) -> bool {
        let whole = 0..folded.len();
        let spans_all = |re: &Regex| re.find_iter(folded).any(|m| m.range() == whole);
        [
            &self.update_verb,
            &self.list_verb,
            &self.count_word,
            &self.search_verb,
            &self.project_noun,
            &self.deadline_noun,
            &self.progress_noun,
            &self.all_projects,
        ]
        .into_iter()
        .any(spans_all)
            || self
                .status
                .mentions(folded)
                .iter()
                .any(|m| m.start == 0 && m.end == folded.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_alternation_shapes() {
        assert_eq!(build_alternation(&[]), "");
        assert_eq!(build_alternation(&["mois"]), "mois");
        assert_eq!(build_alternation(&["an", "annee"]), "(?:annee|an)");
        assert_eq!(build_alternation(&["ceux-la"]), regex::escape("ceux-la"));
    }

    #[test]
    fn test_word_regex_respects_boundaries() {
        let re = word_regex(&["met", "mets"]).unwrap();
        assert!(re.is_match("mets les a 80%"));
        assert!(!re.is_match("metal"));
    }

    #[test]
    fn test_vocabulary_covers_whole_words_only() {
        let lexicon = Lexicon::new().unwrap();
        assert!(lexicon.is_vocabulary("deadline"));
        assert!(lexicon.is_vocabulary("en cours"));
        assert!(lexicon.is_vocabulary("projets"));
        assert!(!lexicon.is_vocabulary("nuit blanche"));
        assert!(!lexicon.is_vocabulary("deadline rush"));
    }

    #[test]
    fn test_create_phrase() {
        let lexicon = Lexicon::new().unwrap();
        assert!(lexicon.create_phrase.is_match("cree un nouveau projet nuit blanche"));
        assert!(lexicon.create_phrase.is_match("nouveau projet"));
        assert!(!lexicon.create_phrase.is_match("ajoute une note"));
    }
}
