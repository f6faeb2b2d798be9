//! Lexical tables.
//!
//! All entries are in folded form (lowercase, no diacritics, ASCII
//! apostrophes) because every pattern runs on folded text. Extractors build
//! their regexes from these tables; adding a synonym here never requires
//! touching extraction logic.

use super::status::ProjectStatus;

/// Calendar unit a time word maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Days,
    Weeks,
    Months,
    Years,
}

/// Canonical field a user can mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Status,
    Progress,
    Deadline,
    Collab,
    Style,
    Label,
    LabelFinal,
    Note,
}

// =============================================================================
// VERBS
// =============================================================================

/// Verbs that introduce a modification
pub const UPDATE_VERBS: &[&str] = &[
    // French
    "mets", "met", "mettre", "mettez", "passe", "passer", "passez", "change", "changer",
    "changez", "modifie", "modifier", "modifiez", "marque", "marquer", "marquez", "bascule",
    "basculer", "transforme", "transformer", "remplace", "remplacer", "repousse", "repousser",
    "pousse", "pousser", "decale", "decaler", "prolonge", "prolonger", "rallonge", "rallonger",
    "retarde", "retarder", "recule", "reculer", "avance", "avancer", "supprime", "supprimer",
    "retire", "retirer", "enleve", "enlever", "efface", "effacer", "attribue", "assigne",
    "definis", "fixe", "fixer", "raccourcis", "reduis",
    // English
    "set", "update", "move", "mark", "put", "switch", "push", "postpone", "delay", "extend",
    "remove", "clear", "assign", "shorten",
];

/// Verbs that shift a deadline later
pub const PUSH_VERBS: &[&str] = &[
    "pousse", "pousser", "repousse", "repousser", "decale", "decaler", "prolonge", "prolonger",
    "rallonge", "rallonger", "retarde", "retarder", "ajoute", "ajouter", "rajoute", "rajouter",
    "push", "postpone", "delay", "extend", "add",
];

/// Verbs that shift a deadline earlier (the delta is negated)
pub const PULL_VERBS: &[&str] = &[
    "enleve", "enlever", "retire", "retirer", "recule", "reculer", "avance", "avancer",
    "raccourcis", "raccourcir", "reduis", "reduire", "subtract", "shorten",
];

/// Push verbs that only ever apply to deadlines
pub const DEADLINE_ONLY_VERBS: &[&str] = &[
    "repousse", "repousser", "decale", "decaler", "prolonge", "prolonger", "rallonge",
    "rallonger", "retarde", "retarder", "postpone", "delay", "extend",
];

/// Verbs that delete a field value
pub const REMOVE_VERBS: &[&str] = &[
    "supprime", "supprimer", "retire", "retirer", "enleve", "enlever", "efface", "effacer",
    "vire", "virer", "remove", "delete", "clear", "drop",
];

/// Verbs that ask for a listing
pub const LIST_VERBS: &[&str] = &[
    "liste", "lister", "listez", "affiche", "afficher", "affichez", "montre", "montrer",
    "montrez", "donne", "donner", "donnez", "voir", "vois", "sors", "trouve", "trouver",
    "quels", "quelles", "quel", "quelle", "show", "list", "display", "give", "find", "get",
    "see", "fetch", "which",
];

/// Words that ask for a count
pub const COUNT_WORDS: &[&str] = &[
    "combien", "nombre de", "compte", "compter", "how many", "count", "number of",
];

/// Verbs that introduce a free-text search
pub const SEARCH_VERBS: &[&str] = &[
    "cherche", "chercher", "recherche", "rechercher", "search", "look for", "lookup",
];

/// Verbs that introduce a creation (must be followed by a project noun)
pub const CREATE_VERBS: &[&str] = &[
    "cree", "creer", "creez", "ajoute", "ajouter", "rajoute", "lance", "demarre", "commence",
    "create", "add", "start", "new",
];

/// Verbs that introduce a note
pub const NOTE_VERBS: &[&str] = &[
    "ajoute", "ajouter", "rajoute", "mets", "met", "ecris", "note", "add", "write", "put",
];

// =============================================================================
// NOUNS, PRONOUNS, MARKERS
// =============================================================================

pub const PROJECT_NOUNS: &[&str] = &[
    "projets", "projet", "projects", "project", "prods", "prod", "tracks", "track", "morceaux",
    "morceau", "sons",
];

/// Pronouns that point back at a previous result set
pub const SCOPE_PRONOUNS: &[&str] = &[
    "les", "leur", "leurs", "eux", "them", "their", "they",
];

pub const DEMONSTRATIVES: &[&str] = &[
    "ceux-la", "ceux la", "celles-la", "celles la", "ceux-ci", "ceux ci", "celles-ci",
    "celles ci", "ces projets", "ces prods", "ces derniers", "ces dernieres", "les memes",
    "those", "these", "the same ones", "those ones",
];

/// Sentence openers that chain onto the previous turn
pub const IMPLICIT_MARKERS: &[&str] = &[
    "et maintenant", "maintenant", "ensuite", "puis", "et", "alors", "aussi", "and now",
    "and", "then", "now", "also",
];

pub const ALL_PROJECTS_PHRASES: &[&str] = &[
    "tous les projets", "toutes les prods", "tous mes projets", "tous les sons",
    "tous les morceaux", "l'ensemble des projets", "all projects", "all the projects",
    "all my projects", "every project", "everything",
];

/// Words that announce a target value ("en", "à", "comme"...)
pub const TARGET_MARKERS: &[&str] = &[
    "en", "a", "au", "comme", "vers", "statut", "status", "to", "as", "into",
];

pub const DEADLINE_NOUNS: &[&str] = &[
    "deadlines", "deadline", "echeances", "echeance", "dates limites", "date limite",
    "due dates", "due date",
];

pub const PROGRESS_NOUNS: &[&str] = &[
    "avancement", "progression", "progress", "pourcentage", "completion",
];

/// Words that end a captured free-text value
pub const VALUE_STOP_WORDS: &[&str] = &[
    "a", "au", "en", "et", "pour", "qui", "avec", "par", "sur", "dans", "de", "des", "du",
    "comme", "que", "dont", "ou", "avant", "apres", "to", "in", "and", "with", "for", "on",
    "by", "as", "or", "before", "after", "deadline", "style", "label", "collab", "statut",
    "status", "avancement", "progress", "note",
];

/// Phrases asserting that records already have a deadline (scoping filter)
pub const DEADLINE_POSSESSION_PHRASES: &[&str] = &[
    "avec une deadline", "avec des deadlines", "avec deadline", "qui ont une deadline",
    "qui ont des deadlines", "qui ont deja une deadline", "ayant une deadline",
    "with a deadline", "with deadlines", "with deadline", "that have a deadline",
    "that have deadlines", "having a deadline",
];

pub const DEADLINE_ABSENCE_PHRASES: &[&str] = &[
    "sans deadline", "sans deadlines", "sans echeance", "pas de deadline", "aucune deadline",
    "without a deadline", "without deadline", "without deadlines", "no deadline",
];

pub const NO_PROGRESS_PHRASES: &[&str] = &[
    "sans avancement", "pas d'avancement", "aucun avancement", "sans progression",
    "no progress", "without progress", "zero progress",
];

pub const QUESTION_WORDS: &[&str] = &[
    "quel", "quels", "quelle", "quelles", "combien", "est-ce", "qu'est-ce", "pourquoi",
    "comment", "ou", "quand", "qui", "what", "which", "how", "who", "why", "when", "where",
    "is", "are", "do", "does",
];

pub const GREETINGS: &[&str] = &[
    "bonjour", "salut", "coucou", "hello", "hi", "hey", "merci", "thanks", "thank you",
    "ca va", "how are you", "bonsoir", "yo",
];

/// Questions about the assistant itself
pub const META_PHRASES: &[&str] = &[
    "qui es-tu", "qui es tu", "tu es qui", "t'es qui", "comment tu t'appelles",
    "c'est quoi ton nom", "quel est ton nom", "ton nom", "que sais-tu faire",
    "que sais tu faire", "qu'est-ce que tu sais faire", "qu'est-ce que tu peux faire",
    "tu peux faire quoi", "tu sers a quoi", "es-tu une ia", "es tu une ia", "es-tu un robot",
    "tu es une ia", "quel modele", "who are you", "what are you", "what's your name",
    "what is your name", "your name", "what can you do", "are you a bot", "are you an ai",
    "are you a robot", "which model",
];

pub const FR_MARKERS: &[&str] = &[
    "les", "des", "projets", "projet", "passe", "met", "mets", "liste", "combien", "leur",
    "leurs", "avec", "en", "de", "du", "la", "le", "tous", "quels", "mois", "semaine",
    "semaines", "jours", "sans", "et", "a", "pour", "qui", "ceux", "montre", "affiche",
];

pub const EN_MARKERS: &[&str] = &[
    "the", "projects", "project", "set", "move", "show", "list", "how", "their", "them",
    "with", "to", "done", "push", "by", "month", "months", "week", "weeks", "days", "all",
    "what", "which", "and", "for", "of", "mark", "as", "my",
];

/// Words introducing the fields a user wants displayed
pub const SHOW_MARKERS: &[&str] = &[
    "avec leur", "avec leurs", "avec le", "avec la", "avec les", "avec son", "avec sa",
    "avec ses", "affiche", "montre", "donne", "with their", "with the", "with its", "show",
    "display", "including",
];

// =============================================================================
// SYNONYM TABLES
// =============================================================================

/// Status synonyms (every canonical status has at least one)
pub const STATUS_SYNONYMS: &[(&str, ProjectStatus)] = &[
    ("en cours", ProjectStatus::EnCours),
    ("en progression", ProjectStatus::EnCours),
    ("actifs", ProjectStatus::EnCours),
    ("actif", ProjectStatus::EnCours),
    ("in progress", ProjectStatus::EnCours),
    ("ongoing", ProjectStatus::EnCours),
    ("active", ProjectStatus::EnCours),
    ("terminees", ProjectStatus::Termine),
    ("terminee", ProjectStatus::Termine),
    ("termines", ProjectStatus::Termine),
    ("termine", ProjectStatus::Termine),
    ("finies", ProjectStatus::Termine),
    ("finie", ProjectStatus::Termine),
    ("finis", ProjectStatus::Termine),
    ("fini", ProjectStatus::Termine),
    ("acheves", ProjectStatus::Termine),
    ("acheve", ProjectStatus::Termine),
    ("completed", ProjectStatus::Termine),
    ("finished", ProjectStatus::Termine),
    ("done", ProjectStatus::Termine),
    ("annulees", ProjectStatus::Annule),
    ("annulee", ProjectStatus::Annule),
    ("annules", ProjectStatus::Annule),
    ("annule", ProjectStatus::Annule),
    ("abandonnes", ProjectStatus::Annule),
    ("abandonne", ProjectStatus::Annule),
    ("cancelled", ProjectStatus::Annule),
    ("canceled", ProjectStatus::Annule),
    ("a venir", ProjectStatus::AVenir),
    ("planifies", ProjectStatus::AVenir),
    ("planifie", ProjectStatus::AVenir),
    ("prevus", ProjectStatus::AVenir),
    ("prevu", ProjectStatus::AVenir),
    ("upcoming", ProjectStatus::AVenir),
    ("planned", ProjectStatus::AVenir),
    ("en attente", ProjectStatus::EnAttente),
    ("en pause", ProjectStatus::EnAttente),
    ("suspendus", ProjectStatus::EnAttente),
    ("suspendu", ProjectStatus::EnAttente),
    ("on hold", ProjectStatus::EnAttente),
    ("paused", ProjectStatus::EnAttente),
    ("pending", ProjectStatus::EnAttente),
    ("ghost production", ProjectStatus::GhostProduction),
    ("ghost prod", ProjectStatus::GhostProduction),
    ("ghostprod", ProjectStatus::GhostProduction),
    ("gost prod", ProjectStatus::GhostProduction),
    ("ghost", ProjectStatus::GhostProduction),
    ("gost", ProjectStatus::GhostProduction),
];

/// Field aliases
pub const FIELD_ALIASES: &[(&str, FieldKind)] = &[
    ("statuts", FieldKind::Status),
    ("statut", FieldKind::Status),
    ("status", FieldKind::Status),
    ("etats", FieldKind::Status),
    ("etat", FieldKind::Status),
    ("avancement", FieldKind::Progress),
    ("progression", FieldKind::Progress),
    ("progress", FieldKind::Progress),
    ("pourcentage", FieldKind::Progress),
    ("deadlines", FieldKind::Deadline),
    ("deadline", FieldKind::Deadline),
    ("echeances", FieldKind::Deadline),
    ("echeance", FieldKind::Deadline),
    ("date limite", FieldKind::Deadline),
    ("due date", FieldKind::Deadline),
    ("collaborateurs", FieldKind::Collab),
    ("collaborateur", FieldKind::Collab),
    ("collaboration", FieldKind::Collab),
    ("collabs", FieldKind::Collab),
    ("collab", FieldKind::Collab),
    ("feat", FieldKind::Collab),
    ("styles", FieldKind::Style),
    ("style", FieldKind::Style),
    ("genre", FieldKind::Style),
    ("label final", FieldKind::LabelFinal),
    ("labels finaux", FieldKind::LabelFinal),
    ("final label", FieldKind::LabelFinal),
    ("labels", FieldKind::Label),
    ("label", FieldKind::Label),
    ("maison de disque", FieldKind::Label),
    ("notes", FieldKind::Note),
    ("note", FieldKind::Note),
    ("commentaires", FieldKind::Note),
    ("commentaire", FieldKind::Note),
];

/// Time-unit synonyms with the amount one unit word stands for
pub const TIME_UNITS: &[(&str, TimeUnit, i32)] = &[
    ("jours", TimeUnit::Days, 1),
    ("jour", TimeUnit::Days, 1),
    ("days", TimeUnit::Days, 1),
    ("day", TimeUnit::Days, 1),
    ("quinzaine", TimeUnit::Days, 14),
    ("semaines", TimeUnit::Weeks, 1),
    ("semaine", TimeUnit::Weeks, 1),
    ("weeks", TimeUnit::Weeks, 1),
    ("week", TimeUnit::Weeks, 1),
    ("mois", TimeUnit::Months, 1),
    ("months", TimeUnit::Months, 1),
    ("month", TimeUnit::Months, 1),
    ("trimestres", TimeUnit::Months, 3),
    ("trimestre", TimeUnit::Months, 3),
    ("quarters", TimeUnit::Months, 3),
    ("quarter", TimeUnit::Months, 3),
    ("semestres", TimeUnit::Months, 6),
    ("semestre", TimeUnit::Months, 6),
    ("annees", TimeUnit::Years, 1),
    ("annee", TimeUnit::Years, 1),
    ("ans", TimeUnit::Years, 1),
    ("an", TimeUnit::Years, 1),
    ("years", TimeUnit::Years, 1),
    ("year", TimeUnit::Years, 1),
];

/// Spelled-out quantities; article forms stand for 1
pub const NUMBER_WORDS: &[(&str, u32)] = &[
    ("zero", 0),
    ("un", 1),
    ("une", 1),
    ("one", 1),
    ("a", 1),
    ("an", 1),
    ("deux", 2),
    ("two", 2),
    ("trois", 3),
    ("three", 3),
    ("quatre", 4),
    ("four", 4),
    ("cinq", 5),
    ("five", 5),
    ("six", 6),
    ("sept", 7),
    ("seven", 7),
    ("huit", 8),
    ("eight", 8),
    ("neuf", 9),
    ("nine", 9),
    ("dix", 10),
    ("ten", 10),
    ("quinze", 15),
    ("vingt", 20),
    ("trente", 30),
];

pub const MONTHS: &[(&str, u32)] = &[
    ("janvier", 1),
    ("fevrier", 2),
    ("mars", 3),
    ("avril", 4),
    ("mai", 5),
    ("juin", 6),
    ("juillet", 7),
    ("aout", 8),
    ("septembre", 9),
    ("octobre", 10),
    ("novembre", 11),
    ("decembre", 12),
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("janv", 1),
    ("fev", 2),
    ("sept", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

/// Weekday names, numbered from Monday = 0
pub const WEEKDAYS: &[(&str, u32)] = &[
    ("lundi", 0),
    ("mardi", 1),
    ("mercredi", 2),
    ("jeudi", 3),
    ("vendredi", 4),
    ("samedi", 5),
    ("dimanche", 6),
    ("monday", 0),
    ("tuesday", 1),
    ("wednesday", 2),
    ("thursday", 3),
    ("friday", 4),
    ("saturday", 5),
    ("sunday", 6),
];

/// Canonical style names keyed by folded alias
pub const STYLE_ALIASES: &[(&str, &str)] = &[
    ("hip-hop", "Hip-Hop"),
    ("hip hop", "Hip-Hop"),
    ("hiphop", "Hip-Hop"),
    ("rap", "Rap"),
    ("trap", "Trap"),
    ("drill", "Drill"),
    ("boom bap", "Boom Bap"),
    ("boombap", "Boom Bap"),
    ("r&b", "R&B"),
    ("rnb", "R&B"),
    ("pop", "Pop"),
    ("afrobeats", "Afro"),
    ("afrobeat", "Afro"),
    ("afro", "Afro"),
    ("amapiano", "Amapiano"),
    ("dancehall", "Dancehall"),
    ("reggaeton", "Reggaeton"),
    ("house", "House"),
    ("techno", "Techno"),
    ("electro", "Electro"),
    ("lofi", "Lo-Fi"),
    ("lo-fi", "Lo-Fi"),
    ("jazz", "Jazz"),
    ("soul", "Soul"),
    ("rock", "Rock"),
    ("zouk", "Zouk"),
];

// =============================================================================
// LOOKUPS
// =============================================================================

pub fn time_unit(word: &str) -> Option<(TimeUnit, i32)> {
    TIME_UNITS
        .iter()
        .find(|(w, _, _)| *w == word)
        .map(|(_, unit, amount)| (*unit, *amount))
}

/// Parse a digit string or a spelled-out quantity
pub fn quantity(word: &str) -> Option<u32> {
    if let Ok(n) = word.parse::<u32>() {
        return Some(n);
    }
    NUMBER_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, n)| *n)
}

pub fn month_number(word: &str) -> Option<u32> {
    MONTHS.iter().find(|(w, _)| *w == word).map(|(_, n)| *n)
}

pub fn weekday_number(word: &str) -> Option<u32> {
    WEEKDAYS.iter().find(|(w, _)| *w == word).map(|(_, n)| *n)
}

pub fn canonical_style(word: &str) -> Option<&'static str> {
    STYLE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == word)
        .map(|(_, name)| *name)
}

pub fn field_kind(word: &str) -> Option<FieldKind> {
    FIELD_ALIASES
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, kind)| *kind)
}

/// Keys of a synonym table, for alternation building
pub fn keys<T>(table: &[(&'static str, T)]) -> Vec<&'static str> {
    table.iter().map(|(word, _)| *word).collect()
}
