//! Sentence boundary detection.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::SentenceSpan;

/// Splits text into sentence spans.
///
/// Offsets are character indices into `text`, so spans computed over a page's
/// glyph text index straight into its glyph sequence.
pub trait SentenceSegmenter: Send + Sync {
    /// Sentences of `text`, in order. Spans never overlap and are never empty.
    fn segment(&self, text: &str) -> Vec<SentenceSpan>;
}

/// Terminator run plus any closing quotes or brackets.
fn terminator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"[.!?…。！？]+["'”’)\]]*"#).expect("terminator pattern is valid")
    })
}

/// Tokens that end in a period without ending a sentence (lowercase, no period).
const ABBREVIATIONS: &[&str] = &[
    "al", "approx", "cf", "ch", "dr", "e.g", "eq", "eqs", "etc", "fig", "figs", "i.e", "jr",
    "mr", "mrs", "ms", "no", "nos", "p", "pp", "prof", "ref", "refs", "resp", "sec", "sr",
    "st", "vol", "vs",
];

/// Full-width terminators, which need no following whitespace.
const FULL_WIDTH: &[char] = &['。', '！', '？'];

/// Characters that may open a new sentence besides letters and digits.
const OPENERS: &[char] = &['"', '\'', '“', '‘', '(', '['];

/// Punctuation and abbreviation rules for English-like prose.
#[derive(Debug, Clone, Default)]
pub struct RuleSegmenter {
    extra_abbreviations: Vec<String>,
}

impl RuleSegmenter {
    /// Create a segmenter with the built-in abbreviation list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add abbreviations (case-insensitive, with or without the final period).
    pub fn with_abbreviations<I, S>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_abbreviations.extend(
            abbreviations
                .into_iter()
                .map(|a| a.as_ref().trim_end_matches('.').to_lowercase()),
        );
        self
    }

    fn is_abbreviation(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        ABBREVIATIONS.contains(&token.as_str()) || self.extra_abbreviations.contains(&token)
    }

    /// Whether the terminator run at `start..end` closes a sentence.
    fn is_boundary(&self, text: &str, start: usize, end: usize) -> bool {
        let run = &text[start..end];
        if run.chars().any(|c| FULL_WIDTH.contains(&c)) {
            return true;
        }

        if run.starts_with('.') && !run[1..].starts_with(['.', '!', '?']) {
            let token = preceding_token(&text[..start]);
            if self.is_abbreviation(token) || is_initial(token) {
                return false;
            }
        }

        let rest = &text[end..];
        if rest.is_empty() {
            return true;
        }
        if !rest.starts_with(char::is_whitespace) {
            return false;
        }
        match rest.trim_start().chars().next() {
            None => true,
            Some(c) => c.is_uppercase() || c.is_ascii_digit() || OPENERS.contains(&c),
        }
    }
}

impl SentenceSegmenter for RuleSegmenter {
    fn segment(&self, text: &str) -> Vec<SentenceSpan> {
        let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let char_offset = |byte: usize| offsets.partition_point(|&b| b < byte);

        let mut spans = Vec::new();
        let mut push = |from: usize, to: usize| {
            let slice = &text[from..to];
            let trimmed = slice.trim();
            if trimmed.is_empty() {
                return;
            }
            let begin = from + (slice.len() - slice.trim_start().len());
            let finish = begin + trimmed.len();
            spans.push(SentenceSpan::new(
                char_offset(begin),
                char_offset(finish),
                trimmed,
            ));
        };

        let mut from = 0;
        for m in terminator_pattern().find_iter(text) {
            if self.is_boundary(text, m.start(), m.end()) {
                push(from, m.end());
                from = m.end();
            }
        }
        push(from, text.len());

        spans
    }
}

/// The whitespace-delimited token ending at the end of `before`, without
/// leading brackets or quotes.
fn preceding_token(before: &str) -> &str {
    let token = before
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default();
    token.trim_start_matches(|c: char| OPENERS.contains(&c))
}

/// A single capital letter, as in "J. Smith".
fn is_initial(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}
