/// Parser module
///
/// Turns a spoken calendar question into tokens, an intent and a typed
/// temporal expression.
pub mod expression;
pub mod grammar;
pub mod intent;
pub mod lexer;
pub mod vocabulary;

use log::debug;

pub use expression::{TemporalExpression, TemporalUnit, WeekdayQualifier};
pub use grammar::{GRAMMAR, GrammarRule, ParseError, TemporalMatch, match_expression, match_with};
pub use intent::{Intent, detect_intent};
pub use lexer::{Token, normalize};

/// Everything the skill needs to know about one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUtterance {
    pub tokens: Vec<Token>,
    pub intent: Intent,
    pub temporal: Result<TemporalMatch, ParseError>,
}

/// Normalize an utterance and run intent detection and the built-in grammar on it
pub fn parse_utterance(input: &str) -> ParsedUtterance {
    let tokens = normalize(input);
    let intent = detect_intent(&tokens);
    let temporal = match_expression(&tokens);
    debug!("Parsed '{}': intent={:?}, temporal={:?}", input, intent, temporal);
    ParsedUtterance { tokens, intent, temporal }
}
