//! Leaf parsers over character tokens.
//!
//! These are thin wrappers around the generic token nodes that turn runs of
//! characters into [`Value::Text`].

use crate::grammar::{Grammar, ParserId};
use crate::value::Value;

impl Grammar<char> {
    /// Matches the single character `expected`.
    pub fn char(&mut self, expected: char) -> ParserId {
        self.token(format!("{expected:?}"), move |c: &char| *c == expected)
    }

    /// Matches one ASCII digit.
    pub fn digit(&mut self) -> ParserId {
        self.token("digit", |c: &char| c.is_ascii_digit())
    }

    /// Matches one alphabetic character.
    pub fn letter(&mut self) -> ParserId {
        self.token("letter", |c: &char| c.is_alphabetic())
    }

    /// Matches exactly `text`, reporting it as `Text`.
    pub fn word(&mut self, text: &str) -> ParserId {
        let literal = self.literal(text.chars());
        self.map(literal, Value::into_text)
    }

    /// Matches a run of at least `min` characters accepted by `predicate`,
    /// reporting the run as `Text` at every accepted length.
    pub fn text_while<F>(&mut self, label: impl Into<String>, predicate: F, min: usize) -> ParserId
    where
        F: Fn(&char) -> bool + Send + Sync + 'static,
    {
        let span = self.span(label, predicate, min, None);
        self.map(span, Value::into_text)
    }

    /// Matches a run of whitespace, possibly empty.
    pub fn whitespace(&mut self) -> ParserId {
        self.text_while("whitespace", |c: &char| c.is_whitespace(), 0)
    }

    /// Matches a run of ASCII digits, reporting `Int` for every prefix that
    /// fits in an `i64`.
    pub fn integer(&mut self) -> ParserId {
        let digits = self.span("digit", |c: &char| c.is_ascii_digit(), 1, None);
        self.filter_map(digits, |value| {
            let Value::Text(text) = value.into_text() else {
                return None;
            };
            text.parse().ok().map(Value::Int)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    fn results(grammar: &Grammar<char>, root: ParserId, input: &str) -> Vec<Value<char>> {
        Engine::new(grammar)
            .parse_all(root, input.chars())
            .unwrap()
            .into_iter()
            .map(|m| m.value)
            .collect()
    }

    #[test]
    fn test_word() {
        let mut grammar = Grammar::new();
        let word = grammar.word("let");
        assert_eq!(results(&grammar, word, "let"), vec![Value::Text("let".into())]);
        assert!(results(&grammar, word, "lex").is_empty());
        assert!(results(&grammar, word, "le").is_empty());
    }

    #[test]
    fn test_empty_word_matches_immediately() {
        let mut grammar = Grammar::new();
        let word = grammar.word("");
        assert_eq!(results(&grammar, word, "abc"), vec![Value::Text(String::new())]);
    }

    #[test]
    fn test_text_while_reports_every_length() {
        let mut grammar = Grammar::new();
        let ident = grammar.text_while("ident", |c: &char| c.is_alphanumeric(), 1);
        assert_eq!(
            results(&grammar, ident, "ab1 "),
            vec![
                Value::Text("a".into()),
                Value::Text("ab".into()),
                Value::Text("ab1".into()),
            ]
        );
    }

    #[test]
    fn test_whitespace_accepts_empty() {
        let mut grammar = Grammar::new();
        let ws = grammar.whitespace();
        assert_eq!(
            results(&grammar, ws, " x"),
            vec![Value::Text(String::new()), Value::Text(" ".into())]
        );
    }

    #[test]
    fn test_integer_prefixes() {
        let mut grammar = Grammar::new();
        let int = grammar.integer();
        let eof = grammar.end_of_input();
        let whole = grammar.sequence([int, eof]);
        assert_eq!(
            results(&grammar, int, "42"),
            vec![Value::Int(4), Value::Int(42)]
        );
        assert_eq!(
            results(&grammar, whole, "42"),
            vec![Value::List(vec![Value::Int(42), Value::Unit])]
        );
    }

    #[test]
    fn test_integer_overflow_dropped() {
        let mut grammar = Grammar::new();
        let int = grammar.integer();
        let input = "99999999999999999999";
        let produced = results(&grammar, int, input);
        assert_eq!(produced.len(), 18);
        assert_eq!(produced.last(), Some(&Value::Int(999_999_999_999_999_999)));
    }

    #[test]
    fn test_char_and_digit() {
        let mut grammar = Grammar::new();
        let plus = grammar.char('+');
        let digit = grammar.digit();
        let letter = grammar.letter();
        let expr = grammar.sequence([digit, plus, letter]);
        assert_eq!(
            results(&grammar, expr, "1+x"),
            vec![Value::List(vec![
                Value::Token('1'),
                Value::Token('+'),
                Value::Token('x'),
            ])]
        );
    }
}
