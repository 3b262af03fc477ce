//! Behavioural laws of the combinators: memoization, ambiguity order,
//! optional and repetition results, end of input.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use combinator_framework::{Engine, Grammar, ParserId, Position, Session, Value};
use proptest::prelude::*;
use rstest::rstest;

fn values(grammar: &Grammar<char>, root: ParserId, input: &str) -> Vec<Value<char>> {
    Engine::new(grammar)
        .parse_all(root, input.chars())
        .unwrap()
        .into_iter()
        .map(|m| m.value)
        .collect()
}

fn letters(input: &str) -> Value<char> {
    Value::List(input.chars().map(Value::Token).collect())
}

#[test]
fn test_shared_node_runs_once_per_position() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut grammar = Grammar::new();
    let unit = grammar.success(Value::Unit);
    let counter = Arc::clone(&runs);
    let counted = grammar.map(unit, move |value| {
        counter.fetch_add(1, Ordering::SeqCst);
        value
    });
    let a = grammar.char('a');
    let b = grammar.char('b');
    let left = grammar.sequence([counted, a]);
    let right = grammar.sequence([counted, b]);
    let root = grammar.choice([left, right]);

    let summary = Engine::new(&grammar)
        .parse(root, "a".chars(), Position::new(), |_, _| {})
        .unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(summary.runs(counted), 1);
    assert_eq!(summary.runs(unit), 1);
    assert_eq!(summary.results, 1);
}

#[test]
fn test_shared_node_runs_once_at_each_position() {
    let mut grammar = Grammar::new();
    let letter = grammar.letter();
    let pair = grammar.sequence([letter, letter]);
    let triple = grammar.sequence([letter, letter, letter]);
    let root = grammar.choice([pair, triple]);

    let summary = Engine::new(&grammar)
        .parse(root, "abc".chars(), Position::new(), |_, _| {})
        .unwrap();
    // One run at positions 0, 1 and 2; the triple alone reaches position 2.
    assert_eq!(summary.runs(letter), 3);
    assert_eq!(summary.results, 2);
}

#[test]
fn test_choice_reports_alternatives_in_order() {
    let mut grammar = Grammar::new();
    let a = grammar.success(Value::Token('a'));
    let b = grammar.success(Value::Token('b'));
    let root = grammar.choice([a, b]);
    assert_eq!(
        values(&grammar, root, ""),
        vec![Value::Token('a'), Value::Token('b')]
    );
}

#[test]
fn test_late_handler_gets_every_choice_result_once() {
    let mut grammar = Grammar::new();
    let a = grammar.success(Value::Token('a'));
    let b = grammar.success(Value::Token('b'));
    let either = grammar.choice([a, b]);
    // The second lookup of `either` registers after both results exist.
    let twice = grammar.sequence([either, either]);
    let pair = |x, y| Value::List(vec![Value::Token(x), Value::Token(y)]);
    assert_eq!(
        values(&grammar, twice, ""),
        vec![pair('a', 'a'), pair('a', 'b'), pair('b', 'a'), pair('b', 'b')]
    );
}

#[test]
fn test_optional_of_failure() {
    let mut grammar = Grammar::new();
    let fail = grammar.failure();
    let root = grammar.optional(fail);
    assert_eq!(values(&grammar, root, "xyz"), vec![Value::Nothing]);
}

#[test]
fn test_optional_of_token() {
    let mut grammar = Grammar::new();
    let digit = grammar.digit();
    let root = grammar.optional(digit);
    assert_eq!(
        values(&grammar, root, "7"),
        vec![Value::Nothing, Value::just(Value::Token('7'))]
    );
    assert_eq!(values(&grammar, root, "x"), vec![Value::Nothing]);
}

#[rstest]
#[case("", vec![])]
#[case("a", vec![letters("a")])]
#[case("ab", vec![letters("a"), letters("ab")])]
#[case("abc", vec![letters("a"), letters("ab")])]
#[case("a1", vec![letters("a")])]
fn test_many_one_to_two(#[case] input: &str, #[case] expected: Vec<Value<char>>) {
    let mut grammar = Grammar::new();
    let letter = grammar.letter();
    let root = grammar.many(letter, 1, Some(2));
    assert_eq!(values(&grammar, root, input), expected);
}

#[rstest]
#[case("", 1)]
#[case("a", 0)]
#[case("ab", 0)]
fn test_end_of_input_matches_only_empty_rest(#[case] input: &str, #[case] expected: usize) {
    let mut grammar = Grammar::new();
    let eof = grammar.end_of_input();
    assert_eq!(values(&grammar, eof, input).len(), expected);
}

#[test]
fn test_end_of_input_leaves_nothing_pending() {
    let mut grammar = Grammar::new();
    let eof = grammar.end_of_input();

    let mut session = Session::new(&grammar, eof, Position::new()).unwrap();
    assert!(session.is_live());
    assert!(session.push_token('a').unwrap().is_empty());
    assert!(!session.is_live());
    assert!(session.finish().unwrap().is_empty());

    let mut session = Session::new(&grammar, eof, Position::new()).unwrap();
    assert_eq!(session.finish().unwrap().len(), 1);
    assert!(!session.is_live());
}

#[test]
fn test_token_or_end() {
    let mut grammar = Grammar::new();
    let newline = grammar.token_or_end("newline", |c: &char| *c == '\n');
    assert_eq!(values(&grammar, newline, ""), vec![Value::Unit]);
    assert_eq!(values(&grammar, newline, "\n"), vec![Value::Token('\n')]);
    assert!(values(&grammar, newline, "x").is_empty());
}

proptest! {
    #[test]
    fn prop_many_reports_every_count_in_bounds(
        min in 0usize..4,
        extra in 0usize..4,
        bounded in any::<bool>(),
        len in 0usize..8,
    ) {
        let input: String = "abcdefgh".chars().take(len).collect();
        let max = bounded.then_some(min + extra);
        let mut grammar = Grammar::new();
        let letter = grammar.letter();
        let root = grammar.many(letter, min, max);

        let produced = values(&grammar, root, &input);
        let top = max.map_or(len, |max| max.min(len));
        let expected: Vec<_> = (min..=top).map(|n| letters(&input[..n])).collect();
        prop_assert_eq!(produced, expected);
    }

    #[test]
    fn prop_optional_of_success(n in any::<i64>()) {
        let mut grammar = Grammar::new();
        let value = grammar.success(Value::Int(n));
        let root = grammar.optional(value);
        prop_assert_eq!(
            values(&grammar, root, ""),
            vec![Value::Nothing, Value::just(Value::Int(n))]
        );
    }

    #[test]
    fn prop_choice_keeps_registration_order(count in 1usize..10) {
        let mut grammar = Grammar::new();
        let items: Vec<_> = (0..count)
            .map(|i| grammar.success(Value::Int(i as i64)))
            .collect();
        let root = grammar.choice(items);
        let expected: Vec<_> = (0..count).map(|i| Value::Int(i as i64)).collect();
        prop_assert_eq!(values(&grammar, root, "ignored"), expected);
    }
}
