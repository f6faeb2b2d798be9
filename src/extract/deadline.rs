//! Deadline extraction.
//!
//! Three mutually exclusive outcomes, checked in order:
//! - removal: remove verb + deadline noun, no duration   `newDeadline = null`
//! - relative push/pull: push verb + duration             `pushDeadlineBy`
//! - absolute set: deadline noun + date expression        `newDeadline = date`
//!
//! Removal and push mark the mutation with `requires_deadline`. That flag is
//! a qualifier on the mutation and never narrows the scope; only an explicit
//! possession phrase ("qui ont une deadline") becomes a `hasDeadline` filter,
//! and that is the filter extractor's job.

use std::ops::Range;

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::{Captures, Regex};
use tracing::debug;

use super::preceding_word;
use crate::error::ParseError;
use crate::lexicon::tables::*;
use crate::lexicon::{build_alternation, word_regex, Lexicon, TimeUnit};
use crate::types::DeadlineShift;

/// Deadline mutation found in a query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeadlineExtraction {
    /// `Some(None)` removes the deadline
    pub new_deadline: Option<Option<NaiveDate>>,
    pub push_by: Option<DeadlineShift>,
    pub requires_deadline: bool,
}

impl DeadlineExtraction {
    pub fn is_empty(&self) -> bool {
        self.new_deadline.is_none() && self.push_by.is_none()
    }
}

// =============================================================================
// DATE GRAMMAR
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum DateRule {
    InDuration,
    DayAfterTomorrow,
    Tomorrow,
    Today,
    EndOfMonth,
    EndOfYear,
    NextWeek,
    NextMonth,
    Iso,
    Slashed,
    DayMonth,
    MonthDay,
    Weekday,
}

/// Resolves French/English date expressions against a reference day
pub struct DateResolver {
    rules: Vec<(DateRule, Regex)>,
}

fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let span = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(span)
    } else {
        date.checked_sub_months(span)
    }
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let span = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(span)
    } else {
        date.checked_sub_days(span)
    }
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?;
    add_months(first, 1)?.pred_opt()
}

fn full_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(if year < 100 { 2000 + year } else { year })
}

/// Day/month without a year: this year, or next year once it has passed
fn upcoming(today: NaiveDate, month: u32, day: u32, year: Option<i32>) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if this_year < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(this_year)
    }
}

impl DateResolver {
    pub fn new() -> Result<Self, ParseError> {
        let qty = build_alternation(&keys(NUMBER_WORDS));
        let units = build_alternation(&TIME_UNITS.iter().map(|(w, _, _)| *w).collect::<Vec<_>>());
        let months = build_alternation(&keys(MONTHS));
        let weekdays = build_alternation(&keys(WEEKDAYS));

        let rules = vec![
            (
                DateRule::InDuration,
                Regex::new(&format!(
                    r"\b(?:dans|in|d'ici|within)\s+(?:(\d+)\s*|({qty})\s+)({units})\b"
                ))?,
            ),
            (
                DateRule::DayAfterTomorrow,
                Regex::new(r"\b(?:apres-demain|apres demain|day after tomorrow)\b")?,
            ),
            (DateRule::Tomorrow, Regex::new(r"\b(?:demain|tomorrow)\b")?),
            (
                DateRule::Today,
                Regex::new(r"\b(?:aujourd'hui|aujourd hui|ce soir|today|tonight)\b")?,
            ),
            (
                DateRule::EndOfMonth,
                Regex::new(r"\b(?:fin du mois|fin de mois|end of (?:the )?month)\b")?,
            ),
            (
                DateRule::EndOfYear,
                Regex::new(r"\b(?:fin de l'annee|fin d'annee|fin de l annee|end of (?:the )?year)\b")?,
            ),
            (
                DateRule::NextWeek,
                Regex::new(r"\b(?:la semaine prochaine|semaine prochaine|next week)\b")?,
            ),
            (
                DateRule::NextMonth,
                Regex::new(r"\b(?:le mois prochain|mois prochain|next month)\b")?,
            ),
            (DateRule::Iso, Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b")?),
            (
                DateRule::Slashed,
                Regex::new(r"\b(\d{1,2})[/.](\d{1,2})(?:[/.](\d{2}|\d{4}))?\b")?,
            ),
            (
                DateRule::DayMonth,
                Regex::new(&format!(
                    r"\b(\d{{1,2}}|1er|premier)\s+({months})\.?(?:\s+(\d{{4}}))?\b"
                ))?,
            ),
            (
                DateRule::MonthDay,
                Regex::new(&format!(
                    r"\b({months})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}}))?"
                ))?,
            ),
            (
                DateRule::Weekday,
                Regex::new(&format!(r"\b(?:next\s+)?({weekdays})\b(?:\s+prochain)?"))?,
            ),
        ];

        Ok(Self { rules })
    }

    /// Leftmost date expression in `text`; ties go to the longest match
    pub fn find(&self, text: &str, today: NaiveDate) -> Option<(NaiveDate, Range<usize>)> {
        let mut best: Option<(NaiveDate, Range<usize>)> = None;

        for (rule, regex) in &self.rules {
            for caps in regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let Some(date) = Self::resolve(*rule, &caps, today) else {
                    continue;
                };
                let range = whole.range();
                let better = match &best {
                    None => true,
                    Some((_, b)) => {
                        range.start < b.start || (range.start == b.start && range.len() > b.len())
                    }
                };
                if better {
                    best = Some((date, range));
                }
                break;
            }
        }

        best
    }

    fn resolve(rule: DateRule, caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
        match rule {
            DateRule::InDuration => {
                let qty = match (caps.get(1), caps.get(2)) {
                    (Some(d), _) => d.as_str().parse::<i64>().ok()?,
                    (None, Some(w)) => i64::from(quantity(w.as_str())?),
                    _ => return None,
                };
                let (unit, amount) = time_unit(caps.get(3)?.as_str())?;
                let n = qty.checked_mul(i64::from(amount))?;
                match unit {
                    TimeUnit::Days => add_days(today, n),
                    TimeUnit::Weeks => add_days(today, n.checked_mul(7)?),
                    TimeUnit::Months => add_months(today, n),
                    TimeUnit::Years => add_months(today, n.checked_mul(12)?),
                }
            }
            DateRule::DayAfterTomorrow => add_days(today, 2),
            DateRule::Tomorrow => add_days(today, 1),
            DateRule::Today => Some(today),
            DateRule::EndOfMonth => last_day_of_month(today),
            DateRule::EndOfYear => NaiveDate::from_ymd_opt(today.year(), 12, 31),
            DateRule::NextWeek => add_days(today, 7),
            DateRule::NextMonth => add_months(today, 1),
            DateRule::Iso => NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            ),
            DateRule::Slashed => {
                let day = caps[1].parse().ok()?;
                let month = caps[2].parse().ok()?;
                let year = match caps.get(3) {
                    Some(y) => Some(full_year(y.as_str())?),
                    None => None,
                };
                upcoming(today, month, day, year)
            }
            DateRule::DayMonth => {
                let day = match &caps[1] {
                    "1er" | "premier" => 1,
                    d => d.parse().ok()?,
                };
                let month = month_number(&caps[2])?;
                let year = match caps.get(3) {
                    Some(y) => Some(y.as_str().parse().ok()?),
                    None => None,
                };
                upcoming(today, month, day, year)
            }
            DateRule::MonthDay => {
                let month = month_number(&caps[1])?;
                let day = caps[2].parse().ok()?;
                let year = match caps.get(3) {
                    Some(y) => Some(y.as_str().parse().ok()?),
                    None => None,
                };
                upcoming(today, month, day, year)
            }
            DateRule::Weekday => {
                let target = weekday_number(&caps[1])?;
                let current = today.weekday().num_days_from_monday();
                let mut ahead = (7 + target - current) % 7;
                if ahead == 0 {
                    ahead = 7;
                }
                add_days(today, i64::from(ahead))
            }
        }
    }
}

// =============================================================================
// DEADLINE EXTRACTOR
// =============================================================================

pub struct DeadlineExtractor {
    dates: DateResolver,
    removal: Regex,
    duration: Regex,
    push_verb: Regex,
    pull_verb: Regex,
    deadline_only_verb: Regex,
}

impl DeadlineExtractor {
    pub fn new() -> Result<Self, ParseError> {
        let qty = build_alternation(&keys(NUMBER_WORDS));
        let units = build_alternation(&TIME_UNITS.iter().map(|(w, _, _)| *w).collect::<Vec<_>>());

        Ok(Self {
            dates: DateResolver::new()?,
            removal: Regex::new(&format!(
                r"\b{}\b(?:[\s-]+(?:la|le|les|leur|leurs|sa|son|ses|de|des|du|the|their|its|any))*\s+{}\b",
                build_alternation(REMOVE_VERBS),
                build_alternation(DEADLINE_NOUNS),
            ))?,
            duration: Regex::new(&format!(r"\b(?:(\d+)\s*|({qty})\s+)({units})\b"))?,
            push_verb: word_regex(PUSH_VERBS)?,
            pull_verb: word_regex(PULL_VERBS)?,
            deadline_only_verb: word_regex(DEADLINE_ONLY_VERBS)?,
        })
    }

    pub fn dates(&self) -> &DateResolver {
        &self.dates
    }

    /// Accumulated shift from every "N unit" not introduced by dans/in/d'ici
    fn shift(&self, text: &str) -> Option<DeadlineShift> {
        let mut shift = DeadlineShift::default();

        for caps in self.duration.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if matches!(
                preceding_word(text, whole.start()),
                Some("dans" | "in" | "d'ici" | "within")
            ) {
                continue;
            }

            let qty = match (caps.get(1), caps.get(2)) {
                (Some(d), _) => d.as_str().parse::<i32>().ok(),
                (None, Some(w)) => quantity(w.as_str()).and_then(|q| i32::try_from(q).ok()),
                _ => None,
            };
            let Some(qty) = qty else { continue };
            let Some((unit, amount)) = caps.get(3).and_then(|u| time_unit(u.as_str())) else {
                continue;
            };

            let Some(n) = qty.checked_mul(amount) else { continue };
            let added = match unit {
                TimeUnit::Days => shift.add_days(n),
                TimeUnit::Weeks => shift.add_weeks(n),
                TimeUnit::Months => shift.add_months(n),
                TimeUnit::Years => n.checked_mul(12).is_some_and(|m| shift.add_months(m)),
            };
            if !added {
                debug!(term = whole.as_str(), "Deadline shift term overflows, skipped");
            }
        }

        (!shift.is_empty()).then_some(shift)
    }

    pub fn extract(&self, lexicon: &Lexicon, text: &str, today: NaiveDate) -> DeadlineExtraction {
        let mut out = DeadlineExtraction::default();
        let mentions_deadline = lexicon.mentions_deadline(text);
        let shift = self.shift(text);

        // removal
        if shift.is_none() && self.removal.is_match(text) {
            out.new_deadline = Some(None);
            out.requires_deadline = true;
            return out;
        }

        // relative push / pull
        let pulling = self.pull_verb.is_match(text);
        let pushing = self.push_verb.is_match(text);
        if let Some(shift) = shift {
            if (pushing || pulling) && (mentions_deadline || self.deadline_only_verb.is_match(text)) {
                out.push_by = Some(if pulling { shift.negated() } else { shift });
                out.requires_deadline = true;
                return out;
            }
        }

        // absolute date after the deadline noun or a deadline-only verb
        let anchor = lexicon
            .deadline_noun
            .find(text)
            .or_else(|| self.deadline_only_verb.find(text));
        if let Some(anchor) = anchor {
            if let Some((date, _)) = self.dates.find(&text[anchor.end()..], today) {
                out.new_deadline = Some(Some(date));
            }
        }

        out
    }

    /// Date attached to a deadline noun, for list filters and creation
    pub fn deadline_date(&self, lexicon: &Lexicon, text: &str, today: NaiveDate) -> Option<NaiveDate> {
        let anchor = lexicon.deadline_noun.find(text)?;
        self.dates
            .find(&text[anchor.end()..], today)
            .map(|(date, _)| date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_text;

    fn today() -> NaiveDate {
        // Monday
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn extract(query: &str) -> DeadlineExtraction {
        let lexicon = Lexicon::new().unwrap();
        DeadlineExtractor::new()
            .unwrap()
            .extract(&lexicon, &normalize_text(query), today())
    }

    fn resolve(expr: &str) -> Option<NaiveDate> {
        DateResolver::new()
            .unwrap()
            .find(&normalize_text(expr), today())
            .map(|(d, _)| d)
    }

    #[test]
    fn test_push_by_one_month() {
        let out = extract("pousse leur deadline d'un mois");
        let shift = out.push_by.unwrap();
        assert_eq!(shift.months, Some(1));
        assert_eq!(shift.weeks, None);
        assert!(out.requires_deadline);
        assert_eq!(out.new_deadline, None);
    }

    #[test]
    fn test_push_by_two_weeks() {
        let out = extract("repousse la deadline de 2 semaines");
        assert_eq!(out.push_by.unwrap().weeks, Some(2));
    }

    #[test]
    fn test_pull_negates() {
        let out = extract("enlève 1 mois à leur deadline");
        assert_eq!(out.push_by.unwrap().months, Some(-1));
        assert_eq!(out.new_deadline, None);
    }

    #[test]
    fn test_units_accumulate_and_years_fold() {
        let out = extract("repousse d'un an et 2 mois");
        assert_eq!(out.push_by.unwrap().months, Some(14));

        let out = extract("décale la deadline d'une quinzaine");
        assert_eq!(out.push_by.unwrap().days, Some(14));
    }

    #[test]
    fn test_removal() {
        let out = extract("supprime leur deadline");
        assert_eq!(out.new_deadline, Some(None));
        assert!(out.requires_deadline);
        assert!(out.push_by.is_none());
    }

    #[test]
    fn test_absolute_date() {
        let out = extract("met leur deadline à dans 2 mois");
        assert_eq!(out.new_deadline, Some(Some(date(2026, 5, 2))));
        assert!(out.push_by.is_none());
        assert!(!out.requires_deadline);

        let out = extract("mets la deadline au 15 mars");
        assert_eq!(out.new_deadline, Some(Some(date(2026, 3, 15))));
    }

    #[test]
    fn test_no_deadline_words_no_outcome() {
        assert!(extract("passe les projets en terminé").is_empty());
        assert!(extract("ajoute 2 semaines").is_empty());
    }

    #[test]
    fn test_date_grammar() {
        assert_eq!(resolve("demain"), Some(date(2026, 3, 3)));
        assert_eq!(resolve("après-demain"), Some(date(2026, 3, 4)));
        assert_eq!(resolve("aujourd'hui"), Some(today()));
        assert_eq!(resolve("fin du mois"), Some(date(2026, 3, 31)));
        assert_eq!(resolve("fin de l'année"), Some(date(2026, 12, 31)));
        assert_eq!(resolve("la semaine prochaine"), Some(date(2026, 3, 9)));
        assert_eq!(resolve("le mois prochain"), Some(date(2026, 4, 2)));
        assert_eq!(resolve("2026-07-14"), Some(date(2026, 7, 14)));
        assert_eq!(resolve("15/01"), Some(date(2027, 1, 15)));
        assert_eq!(resolve("1er avril 2027"), Some(date(2027, 4, 1)));
        assert_eq!(resolve("march 20"), Some(date(2026, 3, 20)));
        assert_eq!(resolve("vendredi"), Some(date(2026, 3, 6)));
        assert_eq!(resolve("lundi prochain"), Some(date(2026, 3, 9)));
        assert_eq!(resolve("in 3 days"), Some(date(2026, 3, 5)));
        assert_eq!(resolve("n'importe quand"), None);
    }

    #[test]
    fn test_oversized_quantities_do_not_overflow() {
        let out = extract("repousse la deadline de 2000000000 jours et 2000000000 jours");
        assert_eq!(out.push_by.unwrap().days, Some(2_000_000_000));

        assert_eq!(resolve("dans 9000000000000000000 semaines"), None);
        assert_eq!(resolve("dans 9000000000000000000 ans"), None);
        let out = extract("mets la deadline dans 9000000000000000000 semaines");
        assert_eq!(out.new_deadline, None);
    }
}
