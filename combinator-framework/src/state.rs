use std::collections::HashMap;

use common_framework::{Position, Token};

use crate::closure::{ClosureId, StepIndex};
use crate::continuation::Continuation;
use crate::grammar::ParserId;

/// Bookkeeping for one token boundary.
///
/// Maps each parser node requested here to its closure, so a node is only
/// ever run once per position, and collects the continuations that wait for
/// the next token.
#[derive(Debug)]
pub(crate) struct ParseState<T> {
    step: StepIndex,
    position: Position,
    closures: HashMap<ParserId, ClosureId>,
    continuations: Vec<Continuation<T>>,
}

impl<T> ParseState<T> {
    pub(crate) fn new(step: StepIndex, position: Position) -> Self {
        Self {
            step,
            position,
            closures: HashMap::new(),
            continuations: Vec::new(),
        }
    }

    pub(crate) fn step(&self) -> StepIndex {
        self.step
    }

    pub(crate) fn position(&self) -> Position {
        self.position
    }

    /// Returns the closure already started for `node` at this position.
    pub(crate) fn lookup(&self, node: ParserId) -> Option<ClosureId> {
        self.closures.get(&node).copied()
    }

    pub(crate) fn remember(&mut self, node: ParserId, closure: ClosureId) {
        self.closures.insert(node, closure);
    }

    /// Queues `continuation` for the next token.
    pub(crate) fn read(&mut self, continuation: Continuation<T>) {
        self.continuations.push(continuation);
    }

    pub(crate) fn has_continuations(&self) -> bool {
        !self.continuations.is_empty()
    }

    pub(crate) fn take_continuations(&mut self) -> Vec<Continuation<T>> {
        std::mem::take(&mut self.continuations)
    }

    /// Starts the state for the position after `token`.
    ///
    /// The memo table is not carried over; only continuations of this state
    /// can refer back to it, and the caller takes those first.
    pub(crate) fn advance<Tok: Token>(&self, token: &Tok) -> Self {
        Self::new(self.step + 1, self.position.next(token))
    }
}
