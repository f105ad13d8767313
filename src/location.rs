//! Heuristic place-name extraction from free text
//!
//! Used to seed a new session with weather for the place the user mentions
//! in their first message ("What should I do today in Tokyo?"). Patterns are
//! tried in order and the first accepted candidate wins; a rejected candidate
//! moves the scan on to the next one. Pure, no I/O.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::error;

/// Surface patterns, tried in order. Capture group 1 is the candidate place.
///
/// 1. A preposition followed by one or two words, in any case.
/// 2. One or two capitalized words followed by a Japanese particle.
const PATTERN_SOURCES: [&str; 2] = [
    r"(?i)\b(?:in|at|for|to)\s+([a-z][a-z]+(?:\s+[a-z][a-z]+)?)",
    r"([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)?)\s*(?:で|の|に|を)",
];

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    PATTERN_SOURCES
        .iter()
        .filter_map(|source| match Regex::new(source) {
            Ok(regex) => Some(regex),
            Err(e) => {
                error!(pattern = %source, "Invalid location pattern: {}", e);
                None
            }
        })
        .collect()
});

/// Major cities accepted regardless of capitalization
const MAJOR_CITIES: &[&str] = &[
    "tokyo",
    "new york",
    "london",
    "paris",
    "berlin",
    "moscow",
    "sydney",
    "melbourne",
    "toronto",
    "vancouver",
    "mumbai",
    "delhi",
    "bangalore",
    "singapore",
    "hong kong",
    "seoul",
    "beijing",
    "shanghai",
    "dubai",
    "istanbul",
    "cairo",
    "rio de janeiro",
    "sao paulo",
    "mexico city",
    "buenos aires",
    "los angeles",
    "chicago",
    "san francisco",
    "miami",
    "boston",
    "seattle",
    "denver",
    "phoenix",
    "dallas",
    "houston",
    "osaka",
    "kyoto",
    "yokohama",
    "nagoya",
    "fukuoka",
    "sapporo",
    "sendai",
    "hiroshima",
    "kobe",
];

/// Japanese city names written in kanji, with the name the weather
/// provider expects. Checked after the surface patterns.
const KANJI_CITIES: &[(&str, &str)] = &[
    ("東京", "Tokyo"),
    ("大阪", "Osaka"),
    ("京都", "Kyoto"),
    ("横浜", "Yokohama"),
    ("名古屋", "Nagoya"),
    ("福岡", "Fukuoka"),
    ("札幌", "Sapporo"),
    ("仙台", "Sendai"),
    ("広島", "Hiroshima"),
    ("神戸", "Kobe"),
];

/// Infers a place name from user text
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LocationExtractor;

impl LocationExtractor {
    pub(crate) fn new() -> Self {
        Self
    }

    /// Extract a place name, or `None` when nothing plausible is found
    pub(crate) fn extract(&self, text: &str) -> Option<String> {
        PATTERNS
            .iter()
            .find_map(|pattern| first_accepted(pattern, text))
            .or_else(|| {
                KANJI_CITIES
                    .iter()
                    .find(|(kanji, _)| text.contains(kanji))
                    .map(|(_, name)| name.to_string())
            })
    }
}

/// Scan every match of `pattern`, overlapping ones included, and return the
/// first candidate that passes the filter
fn first_accepted(pattern: &Regex, text: &str) -> Option<String> {
    let mut start = 0;
    while let Some(captures) = pattern.captures_at(text, start) {
        let whole = captures.get(0)?;
        if let Some(place) = captures.get(1).and_then(|m| accept_candidate(m.as_str().trim())) {
            return Some(place.to_string());
        }
        // "to do in tokyo" consumes "in", so resume one character in
        start = whole.start() + text[whole.start()..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

/// Two-word candidates stand only when they are a known city or both words
/// are capitalized ("New York"); otherwise the first word is tried alone
/// ("London now" becomes "London").
fn accept_candidate(candidate: &str) -> Option<&str> {
    let first = candidate.split_whitespace().next()?;
    if first != candidate {
        let known = MAJOR_CITIES.contains(&candidate.to_lowercase().as_str());
        if known || candidate.split_whitespace().all(starts_uppercase) {
            return Some(candidate);
        }
    }
    is_plausible_place(first).then_some(first)
}

fn starts_uppercase(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Accept known cities, or anything capitalized with at least two characters
fn is_plausible_place(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    if MAJOR_CITIES.contains(&lower.as_str()) {
        return true;
    }
    candidate.chars().count() >= 2 && starts_uppercase(candidate)
}
