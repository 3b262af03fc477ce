//! Error types for grammar construction and engine driving.
//!
//! A parse that simply does not match is not an error: it produces no
//! results. These types only cover contract violations by the caller and
//! broken engine invariants.

use thiserror::Error;

use crate::grammar::ParserId;

/// A grammar that cannot be run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// The id was not produced by this grammar.
    #[error("parser {0} does not belong to this grammar")]
    UnknownParser(ParserId),

    /// A rule was declared with `rule()` but never given a body.
    #[error("rule {0} was declared but never defined")]
    UndefinedRule(ParserId),

    /// `define()` was called twice for the same rule.
    #[error("rule {0} is already defined")]
    Redefined(ParserId),

    /// `define()` was called on something other than a declared rule.
    #[error("parser {0} is not a declared rule")]
    NotARule(ParserId),

    /// A repetition whose lower bound exceeds its upper bound.
    #[error("repetition {id} has min {min} greater than max {max}")]
    InvalidBounds { id: ParserId, min: usize, max: usize },

    /// An unbounded repetition over a parser that can succeed without
    /// consuming a token would recurse forever at one position.
    #[error("unbounded repetition {0} repeats a parser that can match without consuming input")]
    NullableRepetition(ParserId),
}

/// Failure while driving a parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// The per-step task budget configured in `EngineOptions` ran out.
    #[error("step at token {index} exceeded the budget of {budget} tasks")]
    BudgetExhausted { index: usize, budget: usize },

    /// A token or end of input was pushed after `finish()`.
    #[error("session already received end of input")]
    Finished,

    /// The engine observed state that its own bookkeeping rules out.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}
