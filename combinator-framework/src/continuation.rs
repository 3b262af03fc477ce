use crate::closure::ClosureId;
use crate::grammar::ParserId;

/// What the engine hands a pending continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Input<'a, T> {
    Token(&'a T),
    End,
}

/// A computation suspended until the next token or the end of input.
///
/// `target` is the closure a successful resumption reports into.
#[derive(Debug)]
pub(crate) enum Continuation<T> {
    /// End-of-input node waiting to see whether input ends here.
    EndOfInput { target: ClosureId },
    /// Single token filter.
    Filter { target: ClosureId, node: ParserId },
    /// Token run that has accepted `acc` so far.
    Span {
        target: ClosureId,
        node: ParserId,
        acc: Vec<T>,
    },
    /// Literal that has matched its first `matched` tokens.
    Literal {
        target: ClosureId,
        node: ParserId,
        matched: usize,
    },
}

impl<T> Continuation<T> {
    pub(crate) fn target(&self) -> ClosureId {
        match self {
            Continuation::EndOfInput { target }
            | Continuation::Filter { target, .. }
            | Continuation::Span { target, .. }
            | Continuation::Literal { target, .. } => *target,
        }
    }
}
