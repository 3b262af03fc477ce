//! Ambiguous calculator.
//!
//! The grammar is deliberately left recursive and has no precedence:
//!
//! ```text
//! expr := expr op expr | '(' expr ')' | integer
//! op   := '+' | '-' | '*' | '/'
//! ```
//!
//! Every way of bracketing the input is a separate derivation, and each one is
//! evaluated while it is parsed. The binary prints every distinct value
//! together with how many derivations produced it.
//!
//! ```text
//! $ calc-parser "1 + 2 * 3"
//! 1 + 2 * 3 => 7 (1 derivation), 9 (1 derivation)
//! ```

use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::process::ExitCode;

use clap::{ArgAction, Parser as CliParser};
use combinator_framework::{Engine, EngineError, EngineOptions, Grammar, ParserId, Value};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, CliParser)]
#[command(name = "calc-parser", about = "Evaluate every bracketing of an arithmetic expression")]
struct Cli {
    /// Expressions to evaluate; read from stdin, one per line, when omitted.
    expressions: Vec<String>,

    /// Stop after the first derivation.
    #[arg(long)]
    first: bool,

    /// Abort a parse that queues more than this many tasks for one token.
    #[arg(long)]
    budget: Option<usize>,

    /// Drive the parse through the streaming signal adapter.
    #[cfg(feature = "streaming")]
    #[arg(long)]
    stream: bool,

    /// Increase logging verbosity (-v: debug, -vv+: trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "calc_parser=info,combinator_framework=warn",
        1 => "calc_parser=debug,combinator_framework=debug",
        _ => "calc_parser=trace,combinator_framework=trace",
    }
}

/// Consumes the whitespace after a token and keeps the token's value.
fn lexeme(grammar: &mut Grammar<char>, parser: ParserId) -> ParserId {
    let ws = grammar.whitespace();
    let both = grammar.sequence([parser, ws]);
    grammar.filter_map(both, |value| value.into_list()?.into_iter().next())
}

fn binary(value: Value<char>) -> Option<Value<char>> {
    let items = value.into_list()?;
    let lhs = items.first()?.as_int()?;
    let op = items.get(1)?.as_token().copied()?;
    let rhs = items.get(2)?.as_int()?;
    let result = match op {
        '+' => lhs.checked_add(rhs),
        '-' => lhs.checked_sub(rhs),
        '*' => lhs.checked_mul(rhs),
        '/' => lhs.checked_div(rhs),
        _ => None,
    };
    result.map(Value::Int)
}

fn build_grammar() -> Result<(Grammar<char>, ParserId), EngineError> {
    let mut grammar = Grammar::new();
    let expr = grammar.rule();

    let int = grammar.integer();
    let number = lexeme(&mut grammar, int);
    let ops: Vec<_> = ['+', '-', '*', '/']
        .into_iter()
        .map(|c| grammar.char(c))
        .collect();
    let op = grammar.choice(ops);
    let op = lexeme(&mut grammar, op);
    let open = grammar.char('(');
    let open = lexeme(&mut grammar, open);
    let close = grammar.char(')');
    let close = lexeme(&mut grammar, close);

    let operation = grammar.sequence([expr, op, expr]);
    let operation = grammar.filter_map(operation, binary);
    let group = grammar.sequence([open, expr, close]);
    let group = grammar.filter_map(group, |value| value.into_list()?.into_iter().nth(1));
    let body = grammar.choice([operation, group, number]);
    grammar.define(expr, body)?;

    let ws = grammar.whitespace();
    let eof = grammar.end_of_input();
    let whole = grammar.sequence([ws, expr, eof]);
    let root = grammar.filter_map(whole, |value| value.into_list()?.into_iter().nth(1));
    grammar.validate(root)?;
    Ok((grammar, root))
}

/// Maps every derived value to the number of derivations producing it.
type Tally = BTreeMap<i64, usize>;

fn evaluate(
    grammar: &Grammar<char>,
    root: ParserId,
    options: EngineOptions,
    input: &str,
) -> Result<Tally, EngineError> {
    let mut tally = Tally::new();
    let summary = Engine::with_options(grammar, options).parse(
        root,
        input.chars(),
        Default::default(),
        |value, position| {
            debug!(?value, %position, "derivation");
            if let Some(n) = value.as_int() {
                *tally.entry(n).or_default() += 1;
            }
        },
    )?;
    debug!(
        tokens = summary.tokens,
        closures = summary.closures,
        results = summary.results,
        "evaluated"
    );
    Ok(tally)
}

#[cfg(feature = "streaming")]
fn evaluate_streaming(
    grammar: &Grammar<char>,
    root: ParserId,
    options: EngineOptions,
    input: &str,
) -> Result<Tally, EngineError> {
    use combinator_framework::{Session, StreamingSession};
    use common_framework::{Inbound, Outbound, StreamingSignal};

    let session = Session::with_options(grammar, root, Default::default(), options)?;
    let mut stream = StreamingSession::new(session);
    let mut chars = input.chars();
    let mut tally = Tally::new();

    while let Some(signal) = stream.next_signal() {
        match signal {
            StreamingSignal::NeedToken => match chars.next() {
                Some(c) => stream.handle_signal(StreamingSignal::SupplyToken(c)),
                None => stream.handle_signal(StreamingSignal::EndOfInput),
            },
            StreamingSignal::Produced(matches) | StreamingSignal::Finished(matches) => {
                for m in matches {
                    if let Some(n) = m.value.as_int() {
                        *tally.entry(n).or_default() += 1;
                    }
                }
            }
            StreamingSignal::Blocked(reason) => {
                return Err(EngineError::Internal(reason));
            }
            StreamingSignal::SupplyToken(_) | StreamingSignal::EndOfInput => {}
        }
    }
    Ok(tally)
}

fn render(input: &str, tally: &Tally) -> String {
    if tally.is_empty() {
        return format!("{input} => no derivation");
    }
    let values: Vec<_> = tally
        .iter()
        .map(|(value, count)| {
            let noun = if *count == 1 { "derivation" } else { "derivations" };
            format!("{value} ({count} {noun})")
        })
        .collect();
    format!("{input} => {}", values.join(", "))
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

    let (grammar, root) = match build_grammar() {
        Ok(built) => built,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    info!(nodes = grammar.len(), "grammar ready");

    let mut options = EngineOptions::new();
    if cli.first {
        options = options.first_match();
    }
    if let Some(budget) = cli.budget {
        options = options.with_step_budget(budget);
    }

    let inputs: Vec<String> = if cli.expressions.is_empty() {
        io::stdin().lock().lines().map_while(Result::ok).collect()
    } else {
        cli.expressions.clone()
    };

    let mut status = ExitCode::SUCCESS;
    for input in inputs.iter().filter(|line| !line.trim().is_empty()) {
        #[cfg(feature = "streaming")]
        let result = if cli.stream {
            evaluate_streaming(&grammar, root, options, input)
        } else {
            evaluate(&grammar, root, options, input)
        };
        #[cfg(not(feature = "streaming"))]
        let result = evaluate(&grammar, root, options, input);

        match result {
            Ok(tally) => println!("{}", render(input, &tally)),
            Err(err) => {
                eprintln!("{input}: {err}");
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}
