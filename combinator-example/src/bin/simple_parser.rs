//! Shows where each result of a small grammar is recognized.
//!
//! The input is fed one character at a time; every time the root parser
//! succeeds the match is printed with the position it ended at.
//!
//! ```text
//! $ simple-parser --grammar letters abc
//! [0] 1:1  []
//! [1] 1:2  [a]
//! [2] 1:3  [a, b]
//! [3] 1:4  [a, b, c]
//! ```

use std::process::ExitCode;

use clap::{ArgAction, Parser as CliParser, ValueEnum};
use combinator_framework::{Engine, EngineError, Grammar, ParserId, Position, Value};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Example {
    /// Two digits in a row.
    Digits,
    /// Any number of letters.
    Letters,
    /// Comma separated words, with optional spaces.
    Words,
}

#[derive(Debug, CliParser)]
#[command(name = "simple-parser", about = "Print every match of a small grammar")]
struct Cli {
    /// Text to parse.
    input: String,

    /// Grammar to run.
    #[arg(short, long, value_enum, default_value_t = Example::Letters)]
    grammar: Example,

    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "simple_parser=info,combinator_framework=warn",
        1 => "simple_parser=debug,combinator_framework=debug",
        _ => "simple_parser=trace,combinator_framework=trace",
    }
}

fn build(example: Example) -> (Grammar<char>, ParserId) {
    let mut grammar = Grammar::new();
    let root = match example {
        Example::Digits => {
            let digit = grammar.digit();
            grammar.sequence([digit, digit])
        }
        Example::Letters => {
            let letter = grammar.letter();
            grammar.many(letter, 0, None)
        }
        Example::Words => {
            let word = grammar.text_while("word", |c: &char| c.is_alphanumeric(), 1);
            let comma = grammar.char(',');
            let ws = grammar.whitespace();
            let tail = grammar.sequence([comma, ws, word]);
            let tail = grammar.filter_map(tail, |value| value.into_list()?.pop());
            let tails = grammar.many(tail, 0, None);
            let list = grammar.sequence([word, tails]);
            grammar.map(list, |value| match value.into_list() {
                Some(mut parts) => {
                    let rest = parts.pop().and_then(Value::into_list).unwrap_or_default();
                    parts.extend(rest);
                    Value::List(parts)
                }
                None => Value::Nothing,
            })
        }
    };
    (grammar, root)
}

fn describe(value: &Value<char>) -> String {
    match value {
        Value::Unit => "()".to_string(),
        Value::Token(c) => c.to_string(),
        Value::Text(text) => format!("{text:?}"),
        Value::Int(n) => n.to_string(),
        Value::Nothing => "none".to_string(),
        Value::Just(inner) => format!("some({})", describe(inner)),
        Value::List(items) => {
            let items: Vec<_> = items.iter().map(describe).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

fn run(example: Example, input: &str) -> Result<Vec<String>, EngineError> {
    let (grammar, root) = build(example);
    let mut lines = Vec::new();
    let summary = Engine::new(&grammar).parse(
        root,
        input.chars(),
        Position::new(),
        |value, position| {
            lines.push(format!("[{}] {position}  {}", position.index, describe(&value)))
        },
    )?;
    tracing::debug!(
        tokens = summary.tokens,
        closures = summary.closures,
        "parse finished"
    );
    Ok(lines)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli.grammar, &cli.input) {
        Ok(lines) if lines.is_empty() => {
            println!("no match");
            ExitCode::SUCCESS
        }
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters() {
        assert_eq!(
            run(Example::Letters, "abc").unwrap(),
            vec![
                "[0] 1:1  []",
                "[1] 1:2  [a]",
                "[2] 1:3  [a, b]",
                "[3] 1:4  [a, b, c]",
            ]
        );
    }

    #[test]
    fn test_digits() {
        assert_eq!(run(Example::Digits, "12").unwrap(), vec!["[2] 1:3  [1, 2]"]);
        assert!(run(Example::Digits, "1").unwrap().is_empty());
    }

    #[test]
    fn test_words() {
        let lines = run(Example::Words, "ab, c").unwrap();
        assert_eq!(
            lines,
            vec![
                "[1] 1:2  [\"a\"]",
                "[2] 1:3  [\"ab\"]",
                "[5] 1:6  [\"ab\", \"c\"]",
            ]
        );
    }
}
