//! Temporal pattern matcher
//!
//! The grammar is an ordered table of rules. Each rule inspects the token
//! stream starting at some position and either produces an expression plus the
//! number of tokens it consumed, or declines. Rules are tried in table order
//! and every rule gets a chance at every position before the next rule runs, so
//! the table order is the priority order: explicit dates first, then weekday
//! references, then relative keywords. That keeps "1st of december" from being
//! swallowed by a shorter pattern.
//!
//! New phrasings are added by appending a [`GrammarRule`] to a table and
//! calling [`match_with`]; the resolver does not need to change.

use super::expression::{TemporalExpression, WeekdayQualifier};
use super::lexer::Token;
use super::vocabulary;
use chrono::Weekday;
use log::debug;
use std::ops::Range;

/// Error returned when no rule matches anywhere in the token stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("No temporal expression found in the utterance")]
    NoTemporalExpressionFound,
}

/// Signature of a rule: tokens from the window start to the end of the stream
pub type RuleMatcher = fn(&[Token]) -> Option<(TemporalExpression, usize)>;

/// One entry of the grammar table
#[derive(Clone, Copy)]
pub struct GrammarRule {
    pub name: &'static str,
    pub matcher: RuleMatcher,
}

impl GrammarRule {
    pub const fn new(name: &'static str, matcher: RuleMatcher) -> Self {
        Self { name, matcher }
    }
}

impl std::fmt::Debug for GrammarRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarRule").field("name", &self.name).finish()
    }
}

/// A successful match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalMatch {
    pub expression: TemporalExpression,
    pub rule: &'static str,
    /// Token positions covered by the match
    pub span: Range<usize>,
}

/// The built-in grammar, in priority order
pub static GRAMMAR: &[GrammarRule] = &[
    // Explicit calendar dates
    GrammarRule::new("ordinal of month", ordinal_of_month),
    GrammarRule::new("ordinal month", ordinal_month),
    GrammarRule::new("month day", month_day),
    // Weekday references
    GrammarRule::new("next weekday", next_weekday),
    GrammarRule::new("qualified weekday", qualified_weekday),
    GrammarRule::new("bare weekday", bare_weekday),
    // Relative keywords, longer phrases first
    GrammarRule::new("day after tomorrow", day_after_tomorrow),
    GrammarRule::new("in n days", in_days),
    GrammarRule::new("in n weeks", in_weeks),
    GrammarRule::new("this week", this_week),
    GrammarRule::new("next week", next_week),
    GrammarRule::new("tomorrow", tomorrow),
    GrammarRule::new("today", today),
    GrammarRule::new("yesterday", yesterday),
];

/// Match tokens against the built-in grammar
pub fn match_expression(tokens: &[Token]) -> Result<TemporalMatch, ParseError> {
    match_with(GRAMMAR, tokens)
}

/// Match tokens against a caller-supplied grammar table
pub fn match_with(grammar: &[GrammarRule], tokens: &[Token]) -> Result<TemporalMatch, ParseError> {
    for rule in grammar {
        for start in 0..tokens.len() {
            if let Some((expression, consumed)) = (rule.matcher)(&tokens[start..]) {
                debug!("Rule '{}' matched at token {}: {}", rule.name, start, expression);
                return Ok(TemporalMatch {
                    expression,
                    rule: rule.name,
                    span: start..start + consumed,
                });
            }
        }
    }

    debug!("No grammar rule matched {} tokens", tokens.len());
    Err(ParseError::NoTemporalExpressionFound)
}

// Token readers. Each returns the value and how many tokens it used.

fn read_cardinal(tokens: &[Token]) -> Option<(u32, usize)> {
    match tokens.first()? {
        Token::Number(n) => Some((*n, 1)),
        Token::Word(word) => {
            if let Some(tens) = vocabulary::tens(word) {
                let unit = tokens
                    .get(1)
                    .and_then(Token::as_word)
                    .and_then(vocabulary::cardinal)
                    .filter(|unit| (1..=9).contains(unit));
                if let Some(unit) = unit {
                    return Some((tens + unit, 2));
                }
            }
            vocabulary::cardinal(word).map(|n| (n, 1))
        }
        Token::Ordinal(_) => None,
    }
}

fn read_ordinal(tokens: &[Token]) -> Option<(u32, usize)> {
    match tokens.first()? {
        Token::Ordinal(n) => Some((*n, 1)),
        Token::Word(word) => {
            if let Some(tens) = vocabulary::tens(word) {
                let unit = tokens
                    .get(1)
                    .and_then(Token::as_word)
                    .and_then(vocabulary::ordinal)
                    .filter(|unit| (1..=9).contains(unit));
                if let Some(unit) = unit {
                    return Some((tens + unit, 2));
                }
            }
            vocabulary::ordinal(word).map(|n| (n, 1))
        }
        Token::Number(_) => None,
    }
}

fn read_day_of_month(tokens: &[Token]) -> Option<(u32, usize)> {
    match tokens.first()? {
        Token::Number(n) if (1..=31).contains(n) => Some((*n, 1)),
        _ => read_ordinal(tokens),
    }
}

fn read_month(tokens: &[Token]) -> Option<u32> {
    tokens.first().and_then(Token::as_word).and_then(vocabulary::month)
}

fn read_year(tokens: &[Token]) -> Option<i32> {
    match tokens.first()? {
        Token::Number(n) if (1900..=2200).contains(n) => i32::try_from(*n).ok(),
        _ => None,
    }
}

fn read_weekday(tokens: &[Token]) -> Option<Weekday> {
    tokens.first().and_then(Token::as_word).and_then(vocabulary::weekday)
}

fn explicit_date(day: u32, month: u32, rest: &[Token], consumed: usize) -> (TemporalExpression, usize) {
    match read_year(rest) {
        Some(year) => (TemporalExpression::date(day, month, Some(year)), consumed + 1),
        None => (TemporalExpression::date(day, month, None), consumed),
    }
}

// Rules

fn ordinal_of_month(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    let (day, used) = read_ordinal(tokens)?;
    if !tokens.get(used)?.is_word("of") {
        return None;
    }
    let month = read_month(&tokens[used + 1..])?;
    Some(explicit_date(day, month, &tokens[used + 2..], used + 2))
}

fn ordinal_month(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    let (day, used) = read_ordinal(tokens)?;
    let month = read_month(&tokens[used..])?;
    Some(explicit_date(day, month, &tokens[used + 1..], used + 1))
}

fn month_day(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    let month = read_month(tokens)?;
    let skip = if tokens.get(1).is_some_and(|t| t.is_word("the")) { 2 } else { 1 };
    let (day, used) = read_day_of_month(tokens.get(skip..)?)?;
    Some(explicit_date(day, month, &tokens[skip + used..], skip + used))
}

fn next_weekday(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    if !tokens.first()?.is_word("next") {
        return None;
    }
    let weekday = read_weekday(&tokens[1..])?;
    Some((TemporalExpression::weekday(weekday, WeekdayQualifier::Next), 2))
}

fn qualified_weekday(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    if !tokens.first()?.is_any_word(&["on", "for", "this"]) {
        return None;
    }
    let weekday = read_weekday(&tokens[1..])?;
    Some((TemporalExpression::weekday(weekday, WeekdayQualifier::NearestUpcoming), 2))
}

fn bare_weekday(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    let weekday = read_weekday(tokens)?;
    Some((TemporalExpression::weekday(weekday, WeekdayQualifier::NearestUpcoming), 1))
}

fn day_after_tomorrow(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    let phrase = ["day", "after", "tomorrow"];
    if tokens.len() < phrase.len() {
        return None;
    }
    if tokens.iter().zip(phrase).all(|(token, word)| token.is_word(word)) {
        Some((TemporalExpression::days(2), phrase.len()))
    } else {
        None
    }
}

fn in_count_of(tokens: &[Token], units: &[&str]) -> Option<(i64, usize)> {
    if !tokens.first()?.is_word("in") {
        return None;
    }
    let (count, used) = read_cardinal(&tokens[1..])?;
    if !tokens.get(1 + used)?.is_any_word(units) {
        return None;
    }
    Some((i64::from(count), used + 2))
}

fn in_days(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    let (count, used) = in_count_of(tokens, &["day", "days"])?;
    Some((TemporalExpression::days(count), used))
}

fn in_weeks(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    let (count, used) = in_count_of(tokens, &["week", "weeks"])?;
    Some((TemporalExpression::weeks(count), used))
}

fn this_week(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    match tokens {
        [first, second, ..] if first.is_word("this") && second.is_word("week") => {
            Some((TemporalExpression::weeks(0), 2))
        }
        _ => None,
    }
}

fn next_week(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    match tokens {
        [first, second, ..] if first.is_word("next") && second.is_word("week") => {
            Some((TemporalExpression::weeks(1), 2))
        }
        _ => None,
    }
}

fn tomorrow(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    tokens.first()?.is_word("tomorrow").then(|| (TemporalExpression::days(1), 1))
}

fn today(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    tokens.first()?.is_any_word(&["today", "tonight"]).then(|| (TemporalExpression::days(0), 1))
}

fn yesterday(tokens: &[Token]) -> Option<(TemporalExpression, usize)> {
    tokens.first()?.is_word("yesterday").then(|| (TemporalExpression::days(-1), 1))
}
