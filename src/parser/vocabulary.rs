//! Static word lists used by the temporal grammar

use chrono::Weekday;
use phf::phf_map;

const WEEKDAY_MAP: phf::Map<&'static str, Weekday> = phf_map! {
    "monday" => Weekday::Mon,
    "mon" => Weekday::Mon,
    "tuesday" => Weekday::Tue,
    "tue" => Weekday::Tue,
    "tues" => Weekday::Tue,
    "wednesday" => Weekday::Wed,
    "wed" => Weekday::Wed,
    "thursday" => Weekday::Thu,
    "thu" => Weekday::Thu,
    "thurs" => Weekday::Thu,
    "friday" => Weekday::Fri,
    "fri" => Weekday::Fri,
    "saturday" => Weekday::Sat,
    "sat" => Weekday::Sat,
    "sunday" => Weekday::Sun,
    "sun" => Weekday::Sun,
};

const MONTH_MAP: phf::Map<&'static str, u32> = phf_map! {
    "january" => 1,
    "jan" => 1,
    "february" => 2,
    "feb" => 2,
    "march" => 3,
    "mar" => 3,
    "april" => 4,
    "apr" => 4,
    "may" => 5,
    "june" => 6,
    "jun" => 6,
    "july" => 7,
    "jul" => 7,
    "august" => 8,
    "aug" => 8,
    "september" => 9,
    "sep" => 9,
    "sept" => 9,
    "october" => 10,
    "oct" => 10,
    "november" => 11,
    "nov" => 11,
    "december" => 12,
    "dec" => 12,
};

// "a" and "an" count as one ("in a week")
const CARDINAL_MAP: phf::Map<&'static str, u32> = phf_map! {
    "zero" => 0,
    "a" => 1,
    "an" => 1,
    "one" => 1,
    "two" => 2,
    "three" => 3,
    "four" => 4,
    "five" => 5,
    "six" => 6,
    "seven" => 7,
    "eight" => 8,
    "nine" => 9,
    "ten" => 10,
    "eleven" => 11,
    "twelve" => 12,
    "thirteen" => 13,
    "fourteen" => 14,
    "fifteen" => 15,
    "sixteen" => 16,
    "seventeen" => 17,
    "eighteen" => 18,
    "nineteen" => 19,
    "twenty" => 20,
    "thirty" => 30,
};

const ORDINAL_MAP: phf::Map<&'static str, u32> = phf_map! {
    "first" => 1,
    "second" => 2,
    "third" => 3,
    "fourth" => 4,
    "fifth" => 5,
    "sixth" => 6,
    "seventh" => 7,
    "eighth" => 8,
    "ninth" => 9,
    "tenth" => 10,
    "eleventh" => 11,
    "twelfth" => 12,
    "thirteenth" => 13,
    "fourteenth" => 14,
    "fifteenth" => 15,
    "sixteenth" => 16,
    "seventeenth" => 17,
    "eighteenth" => 18,
    "nineteenth" => 19,
    "twentieth" => 20,
    "thirtieth" => 30,
};

/// Look up a weekday name or abbreviation
pub fn weekday(word: &str) -> Option<Weekday> {
    WEEKDAY_MAP.get(word.to_lowercase().as_str()).copied()
}

/// Look up a month name or abbreviation, returning 1..=12
pub fn month(word: &str) -> Option<u32> {
    MONTH_MAP.get(word.to_lowercase().as_str()).copied()
}

/// Look up a cardinal number word ("two" -> 2)
pub fn cardinal(word: &str) -> Option<u32> {
    CARDINAL_MAP.get(word.to_lowercase().as_str()).copied()
}

/// Look up an ordinal number word ("first" -> 1)
pub fn ordinal(word: &str) -> Option<u32> {
    ORDINAL_MAP.get(word.to_lowercase().as_str()).copied()
}

/// Tens words that may prefix a unit word ("twenty one", "thirty first")
pub fn tens(word: &str) -> Option<u32> {
    match word.to_lowercase().as_str() {
        "twenty" => Some(20),
        "thirty" => Some(30),
        _ => None,
    }
}
