use std::fmt::Debug;

use common_framework::{Position, Token};
use tracing::{debug, instrument};

use crate::error::EngineError;
use crate::grammar::{Grammar, ParserId};
use crate::session::{Match, ParseSummary, Session};
use crate::value::Value;

/// Which root results a parse reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultMode {
    /// Every successful derivation, in the order they are recognized.
    #[default]
    All,
    /// Only the first one; no further tokens are pulled after it.
    First,
}

/// Configuration for [`Engine`] and [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineOptions {
    /// Maximum number of queued tasks processed for a single token (or for
    /// the end of input). `None` means no limit.
    pub step_budget: Option<usize>,
    pub mode: ResultMode,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = Some(budget);
        self
    }

    pub fn first_match(mut self) -> Self {
        self.mode = ResultMode::First;
        self
    }
}

/// Drives whole parses over a grammar.
///
/// The engine holds no parse state of its own; every call to
/// [`Engine::parse`] runs an independent [`Session`].
#[derive(Debug)]
pub struct Engine<'g, T> {
    grammar: &'g Grammar<T>,
    options: EngineOptions,
}

impl<'g, T> Engine<'g, T>
where
    T: Token + Clone + Debug,
{
    pub fn new(grammar: &'g Grammar<T>) -> Self {
        Self::with_options(grammar, EngineOptions::default())
    }

    pub fn with_options(grammar: &'g Grammar<T>, options: EngineOptions) -> Self {
        Self { grammar, options }
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Starts an incremental parse of `root` that the caller feeds by hand.
    pub fn session(&self, root: ParserId, start: Position) -> Result<Session<'g, T>, EngineError> {
        Session::with_options(self.grammar, root, start, self.options)
    }

    /// Parses `tokens` with `root`, calling `on_result` for every root
    /// match with the position it was recognized at.
    ///
    /// Tokens are pulled only while some continuation waits for one, so a
    /// parse that dies early leaves the rest of the source untouched.
    #[instrument(level = "debug", skip_all, fields(root = %root))]
    pub fn parse<I, F>(
        &self,
        root: ParserId,
        tokens: I,
        start: Position,
        mut on_result: F,
    ) -> Result<ParseSummary, EngineError>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(Value<T>, Position),
    {
        let mut session = self.session(root, start)?;
        let mut sink = ResultSink {
            mode: self.options.mode,
            delivered: 0,
            on_result: &mut on_result,
        };

        sink.accept(session.take_matches());
        let mut tokens = tokens.into_iter();
        while session.is_live() && !sink.satisfied() {
            let Some(token) = tokens.next() else {
                break;
            };
            sink.accept(session.push_token(token)?);
        }
        if !sink.satisfied() {
            sink.accept(session.finish()?);
        }

        let summary = session.summary();
        debug!(
            tokens = summary.tokens,
            closures = summary.closures,
            delivered = sink.delivered,
            "parse complete"
        );
        Ok(summary)
    }

    /// Parses `tokens` from the start of input and collects the matches.
    pub fn parse_all<I>(&self, root: ParserId, tokens: I) -> Result<Vec<Match<T>>, EngineError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut matches = Vec::new();
        self.parse(root, tokens, Position::new(), |value, position| {
            matches.push(Match { value, position })
        })?;
        Ok(matches)
    }
}

struct ResultSink<'a, T> {
    mode: ResultMode,
    delivered: usize,
    on_result: &'a mut dyn FnMut(Value<T>, Position),
}

impl<T> ResultSink<'_, T> {
    fn satisfied(&self) -> bool {
        self.mode == ResultMode::First && self.delivered > 0
    }

    fn accept(&mut self, matches: Vec<Match<T>>) {
        for Match { value, position } in matches {
            if self.satisfied() {
                return;
            }
            (self.on_result)(value, position);
            self.delivered += 1;
        }
    }
}
