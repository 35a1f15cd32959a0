//! Lexical normalizer for spoken calendar questions
//!
//! Turns a raw utterance into a stream of lowercase tokens. Digit strings are
//! kept apart from words, and digit strings with an ordinal suffix ("1st",
//! "22nd") get their own token type so the grammar can tell "in 2 days" from
//! "2nd of june".

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,4})(st|nd|rd|th)$").expect("ordinal regex is valid"));

/// A single normalized token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// A lowercase word ("tomorrow", "december", "two")
    Word(String),
    /// A cardinal written with digits ("3", "2024")
    Number(u32),
    /// An ordinal written with digits and a suffix ("1st", "23rd")
    Ordinal(u32),
}

impl Token {
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(word) => Some(word.as_str()),
            _ => None,
        }
    }

    pub fn is_word(&self, expected: &str) -> bool {
        self.as_word() == Some(expected)
    }

    pub fn is_any_word(&self, expected: &[&str]) -> bool {
        self.as_word().is_some_and(|word| expected.contains(&word))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(word) => write!(f, "{}", word),
            Token::Number(n) => write!(f, "{}", n),
            Token::Ordinal(n) => write!(f, "{}{}", n, ordinal_suffix(*n)),
        }
    }
}

fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Normalize an utterance into tokens
///
/// Never fails: an empty or punctuation-only utterance yields no tokens.
pub fn normalize(input: &str) -> Vec<Token> {
    let cleaned: String = input
        .to_lowercase()
        .chars()
        .filter(|c| *c != '\'' && *c != '’')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let tokens: Vec<Token> = cleaned.split_whitespace().map(classify).collect();
    debug!("Normalized '{}' into {} tokens", input, tokens.len());
    tokens
}

fn classify(piece: &str) -> Token {
    if piece.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = piece.parse::<u32>() {
            return Token::Number(n);
        }
    }

    if let Some(caps) = ORDINAL_RE.captures(piece) {
        if let Ok(n) = caps[1].parse::<u32>() {
            return Token::Ordinal(n);
        }
    }

    Token::Word(piece.to_string())
}
