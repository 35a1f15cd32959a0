//! Intent detection for calendar questions
//!
//! Most questions ask about a day ("anything tomorrow?"). Two other families
//! ask for the next upcoming appointment, or for when a named appointment
//! takes place ("when is my dentist appointment"). The pipeline only uses
//! those two when the utterance carries no date.

use super::lexer::Token;

const EVENT_WORDS: &[&str] = &[
    "appointment",
    "appointments",
    "event",
    "events",
    "meeting",
    "meetings",
];

const QUESTION_VERBS: &[&str] = &["is", "are", "s", "was"];
const DETERMINERS: &[&str] = &["my", "the", "our", "that"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// What is in the calendar on a given day or range
    Agenda,
    /// What is the next appointment after now
    NextAppointment,
    /// When the upcoming appointments whose title contains the text are
    TitleSearch(String),
}

pub fn detect_intent(tokens: &[Token]) -> Intent {
    let asks_for_next = tokens.windows(2).any(|pair| {
        pair[0].is_any_word(&["next", "upcoming"]) && pair[1].is_any_word(EVENT_WORDS)
    });
    if asks_for_next {
        return Intent::NextAppointment;
    }

    match title_query(tokens) {
        Some(query) => Intent::TitleSearch(query),
        None => Intent::Agenda,
    }
}

/// "when is my dentist appointment" -> "dentist"
fn title_query(tokens: &[Token]) -> Option<String> {
    let when = tokens.iter().position(|t| t.is_any_word(&["when", "whens"]))?;
    let mut rest = &tokens[when + 1..];

    if rest.first().is_some_and(|t| t.is_any_word(QUESTION_VERBS)) {
        rest = &rest[1..];
    }
    if rest.first().is_some_and(|t| t.is_any_word(DETERMINERS)) {
        rest = &rest[1..];
    }

    let words: Vec<&str> = rest
        .iter()
        .map_while(Token::as_word)
        .take_while(|word| !EVENT_WORDS.contains(word))
        .collect();

    if words.is_empty() { None } else { Some(words.join(" ")) }
}
