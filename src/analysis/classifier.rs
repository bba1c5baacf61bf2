//! Formula versus prose classification.
//!
//! A fragment reads as a formula when it is short, contains at least one
//! math symbol, and has few words relative to its operators.

use std::collections::HashSet;

/// Default math-symbol alphabet.
///
/// Operators, relations, arrows, set and logic symbols, super/subscript
/// markers, braces, backslash and the ASCII operators.
pub const DEFAULT_SYMBOLS: &str = concat!(
    "∑∏∫∬∮∂∇∆∞√∛",
    "≈≠≤≥≡≅∼≃∝≪≫",
    "⇔⇒⇐→←↔↦",
    "±∓×÷·∘⊕⊗",
    "∈∉∋⊂⊃⊆⊇∪∩∅",
    "∀∃∄¬∧∨⊢⊨",
    "⁰¹²³⁴⁵⁶⁷⁸⁹⁺⁻⁼₀₁₂₃₄₅₆₇₈₉₊₋₌",
    "^_{}|\\",
    "=+-*/<>",
);

/// Operators counted by the density gate.
pub const DEFAULT_OPERATORS: &str = "=+-*/^_";

/// Formula classifier thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Minimum length in characters
    pub min_len: usize,
    /// Maximum length in characters
    pub max_len: usize,
    /// Characters that mark text as possibly mathematical
    pub symbols: String,
    /// Characters counted as operators for the density gate
    pub operators: String,
    /// Alphabetic runs shorter than this are not words
    pub min_word_len: usize,
    /// Reject when `words >= max_word_ratio * operators`
    pub max_word_ratio: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_len: 5,
            max_len: 300,
            symbols: DEFAULT_SYMBOLS.to_string(),
            operators: DEFAULT_OPERATORS.to_string(),
            min_word_len: 3,
            max_word_ratio: 2.0,
        }
    }
}

impl ClassifierConfig {
    /// Set the accepted length range.
    pub fn with_length_range(mut self, min_len: usize, max_len: usize) -> Self {
        self.min_len = min_len;
        self.max_len = max_len;
        self
    }

    /// Replace the symbol alphabet.
    pub fn with_symbols(mut self, symbols: impl Into<String>) -> Self {
        self.symbols = symbols.into();
        self
    }

    /// Set the word/operator ratio bound.
    pub fn with_max_word_ratio(mut self, ratio: f32) -> Self {
        self.max_word_ratio = ratio;
        self
    }
}

/// Pure formula predicate over a fixed configuration.
#[derive(Debug, Clone)]
pub struct FormulaClassifier {
    config: ClassifierConfig,
    symbols: HashSet<char>,
    operators: HashSet<char>,
}

impl FormulaClassifier {
    /// Create a classifier.
    pub fn new(config: ClassifierConfig) -> Self {
        let symbols = config.symbols.chars().collect();
        let operators = config.operators.chars().collect();
        Self {
            config,
            symbols,
            operators,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Whether `text` should be treated as a formula rather than prose.
    pub fn is_formula(&self, text: &str) -> bool {
        let len = text.chars().count();
        if len < self.config.min_len || len > self.config.max_len {
            return false;
        }

        if !text.chars().any(|c| self.symbols.contains(&c)) {
            return false;
        }

        let symbol_count = text.chars().filter(|c| self.operators.contains(c)).count();
        if symbol_count < 1 {
            return false;
        }

        let word_count = self.word_count(text);
        !(word_count > 0 && word_count as f32 >= self.config.max_word_ratio * symbol_count as f32)
    }

    /// Count words: a purely alphabetic token is one word at any length;
    /// inside mixed tokens only alphabetic runs of `min_word_len` or more count.
    pub fn word_count(&self, text: &str) -> usize {
        text.split_whitespace()
            .map(|token| {
                if token.chars().all(char::is_alphabetic) {
                    1
                } else {
                    alphabetic_runs(token)
                        .filter(|run| *run >= self.config.min_word_len)
                        .count()
                }
            })
            .sum()
    }
}

impl Default for FormulaClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

/// Lengths of the maximal alphabetic runs in `token`.
fn alphabetic_runs(token: &str) -> impl Iterator<Item = usize> + '_ {
    token
        .split(|c: char| !c.is_alphabetic())
        .map(|run| run.chars().count())
        .filter(|len| *len > 0)
}

/// Classify with the default configuration.
pub fn classify(text: &str) -> bool {
    FormulaClassifier::default().is_formula(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_operator_dense_text() {
        assert!(classify("x^2 + y^2 = z^2"));
        assert!(classify("x = y+1"));
        assert!(classify("sin(x)+cos(x)=1"));
        assert!(classify("∑ a_i ≤ n"));
    }

    #[test]
    fn test_rejects_prose_like_ratio() {
        // three words, one operator
        assert!(!classify("a b c = 1"));
        assert!(!classify("The well-known result holds for every case we tried"));
    }

    #[test]
    fn test_length_boundaries() {
        // four and 301 characters are always rejected
        assert!(!classify("x=y+"));
        let long = format!("x={}", "+1".repeat(149) + "0");
        assert_eq!(long.chars().count(), 301);
        assert!(!classify(&long));

        // five and 300 characters are evaluated normally
        assert!(classify("x=y+1"));
        let max = format!("x={}", "+1".repeat(149));
        assert_eq!(max.chars().count(), 300);
        assert!(classify(&max));
    }

    #[test]
    fn test_symbol_necessity() {
        assert!(!classify("hello world"));
        assert!(!classify("12345 67890"));
    }

    #[test]
    fn test_symbol_without_counted_operator() {
        // "≤" passes the symbol gate but is not a counted operator
        assert!(!classify("a ≤ b ≤ c"));
    }

    #[test]
    fn test_deterministic() {
        let samples = ["x = y+1", "plain prose here", "E = mc^2", ""];
        for s in samples {
            assert_eq!(classify(s), classify(s));
        }
    }

    #[test]
    fn test_word_count() {
        let c = FormulaClassifier::default();
        assert_eq!(c.word_count("a b c = 1"), 3);
        assert_eq!(c.word_count("x^2 + y^2 = z^2"), 0);
        assert_eq!(c.word_count("sin(x)+cos(x)=1"), 2);
        assert_eq!(c.word_count("f(x) = log_base"), 2);
    }

    #[test]
    fn test_custom_config() {
        let strict = FormulaClassifier::new(ClassifierConfig::default().with_max_word_ratio(0.5));
        assert!(!strict.is_formula("sin(x)+cos(x)=1"));
        assert!(strict.is_formula("x^2 + y^2 = z^2"));

        let short = FormulaClassifier::new(ClassifierConfig::default().with_length_range(1, 300));
        assert!(short.is_formula("x=1"));
    }
}
