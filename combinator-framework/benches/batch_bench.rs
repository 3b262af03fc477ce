use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use combinator_framework::{Engine, Grammar, ParserId, Position, Value};

// --- Grammars ---

/// `item (',' item)* EOF` where `item` is an integer or an identifier.
fn list_grammar() -> (Grammar<char>, ParserId) {
    let mut grammar = Grammar::new();
    let int = grammar.integer();
    let ident = grammar.text_while("ident", |c: &char| c.is_alphabetic(), 1);
    let item = grammar.choice([int, ident]);
    let comma = grammar.char(',');
    let ws = grammar.whitespace();
    let tail = grammar.sequence([comma, ws, item]);
    let tails = grammar.many(tail, 0, None);
    let eof = grammar.end_of_input();
    let root = grammar.sequence([item, tails, eof]);
    (grammar, root)
}

/// `E := E '+' E | E '*' E | digit`: every bracketing is a derivation.
fn ambiguous_grammar() -> (Grammar<char>, ParserId) {
    let mut grammar = Grammar::new();
    let expr = grammar.rule();
    let digit = grammar.digit();
    let plus = grammar.char('+');
    let times = grammar.char('*');
    let sum = grammar.sequence([expr, plus, expr]);
    let product = grammar.sequence([expr, times, expr]);
    let body = grammar.choice([sum, product, digit]);
    grammar
        .define(expr, body)
        .expect("rule is declared once");
    let eof = grammar.end_of_input();
    let root = grammar.sequence([expr, eof]);
    (grammar, root)
}

// --- Data Generation ---

fn generate_list(items: usize) -> String {
    (0..items)
        .map(|i| if i % 3 == 0 { "name".to_string() } else { (i * 7).to_string() })
        .collect::<Vec<_>>()
        .join(", ")
}

fn generate_expression(operands: usize) -> String {
    (0..operands)
        .map(|i| ((i % 9) + 1).to_string())
        .collect::<Vec<_>>()
        .join(if operands % 2 == 0 { "+" } else { "*" })
}

fn count_results(grammar: &Grammar<char>, root: ParserId, input: &str) -> usize {
    let mut count = 0;
    Engine::new(grammar)
        .parse(root, input.chars(), Position::new(), |value, _| {
            black_box(value);
            count += 1;
        })
        .expect("benchmark grammar is valid");
    count
}

fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("combinator_list");
    let (grammar, root) = list_grammar();

    for items in [100, 1_000] {
        let input = generate_list(items);
        group.throughput(Throughput::Elements(input.chars().count() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(items), &input, |b, input| {
            b.iter(|| assert_eq!(count_results(&grammar, root, input), 1))
        });
    }
    group.finish();
}

fn bench_ambiguous(c: &mut Criterion) {
    let mut group = c.benchmark_group("combinator_ambiguous");
    let (grammar, root) = ambiguous_grammar();

    for operands in [4, 6, 8] {
        let input = generate_expression(operands);
        group.bench_with_input(BenchmarkId::from_parameter(operands), &input, |b, input| {
            b.iter(|| count_results(&grammar, root, input))
        });
    }
    group.finish();
}

fn bench_letters(c: &mut Criterion) {
    let mut group = c.benchmark_group("combinator_repeat");
    let mut grammar = Grammar::new();
    let letter = grammar.letter();
    let word = grammar.many(letter, 0, None);
    let input: String = std::iter::repeat("abcdefghij").take(100).collect();

    group.throughput(Throughput::Elements(input.len() as u64));
    group.bench_function("many_letters_1k", |b| {
        b.iter(|| {
            let mut last = None;
            Engine::new(&grammar)
                .parse(word, input.chars(), Position::new(), |value: Value<char>, _| {
                    last = Some(value)
                })
                .expect("benchmark grammar is valid");
            black_box(last)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_list, bench_ambiguous, bench_letters);
criterion_main!(benches);
