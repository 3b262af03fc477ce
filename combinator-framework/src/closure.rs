use std::rc::Rc;

use common_framework::Position;

use crate::grammar::ParserId;
use crate::value::Value;

/// Index of a closure in the session's closure arena.
pub(crate) type ClosureId = usize;

/// Index of the step (tokens consumed) a result was recorded at.
pub(crate) type StepIndex = usize;

/// Where a result goes once a closure records it.
///
/// Each variant captures only what it needs to route a value forward.
#[derive(Debug)]
pub(crate) enum Handler<T> {
    /// Hand the value to the caller of the parse.
    Root,
    /// Report the value unchanged into `target`.
    Forward { target: ClosureId },
    /// Report `Just(value)` into `target`.
    Just { target: ClosureId },
    /// Apply the action of map node `node`, report into `target`.
    Map { target: ClosureId, node: ParserId },
    /// Sequence `node` has matched its first `next` children with `acc`.
    Sequence {
        target: ClosureId,
        node: ParserId,
        next: usize,
        acc: Vec<Value<T>>,
    },
    /// Repetition `node` has matched `count` items with `acc`.
    Repeat {
        target: ClosureId,
        node: ParserId,
        count: usize,
        acc: Vec<Value<T>>,
    },
}

#[cfg(test)]
impl<T> Handler<T> {
    /// Closure this handler reports into, if any.
    pub(crate) fn target(&self) -> Option<ClosureId> {
        match self {
            Handler::Root => None,
            Handler::Forward { target }
            | Handler::Just { target }
            | Handler::Map { target, .. }
            | Handler::Sequence { target, .. }
            | Handler::Repeat { target, .. } => Some(*target),
        }
    }
}

/// Memo cell for one parser node at one position.
///
/// Results and handlers are append-only. Delivery is driven by the session's
/// task queue, so neither list changes while the session walks it.
#[derive(Debug)]
pub(crate) struct Closure<T> {
    pub(crate) node: ParserId,
    pub(crate) step: StepIndex,
    pub(crate) position: Position,
    pub(crate) parent: Option<ClosureId>,
    results: Vec<(Value<T>, StepIndex)>,
    handlers: Vec<Rc<Handler<T>>>,
}

impl<T: Clone> Closure<T> {
    pub(crate) fn new(
        node: ParserId,
        step: StepIndex,
        position: Position,
        parent: Option<ClosureId>,
    ) -> Self {
        Self {
            node,
            step,
            position,
            parent,
            results: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Adds a handler and returns the results it must be replayed.
    pub(crate) fn register(&mut self, handler: Rc<Handler<T>>) -> Vec<(Value<T>, StepIndex)> {
        self.handlers.push(handler);
        self.results.clone()
    }

    /// Records a result and returns the handlers it must be delivered to.
    ///
    /// Only results of the closure's own step are kept for replay; once the
    /// parse has moved past that step nothing can register here again.
    pub(crate) fn record(&mut self, value: Value<T>, step: StepIndex) -> Vec<Rc<Handler<T>>> {
        if step == self.step {
            self.results.push((value, step));
        }
        self.handlers.clone()
    }

    /// Drops the recorded results once the closure's step is over.
    pub(crate) fn retire(&mut self) {
        self.results = Vec::new();
    }

    #[cfg(test)]
    pub(crate) fn results(&self) -> impl Iterator<Item = &Value<T>> {
        self.results.iter().map(|(value, _)| value)
    }

    #[cfg(test)]
    pub(crate) fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_replays_recorded_results() {
        let mut closure: Closure<char> =
            Closure::new(ParserId::from_index(0), 0, Position::new(), None);
        assert!(closure.record(Value::Token('a'), 0).is_empty());
        assert!(closure.record(Value::Token('b'), 0).is_empty());

        let replay = closure.register(Rc::new(Handler::Root));
        let values: Vec<_> = replay.into_iter().map(|(value, _)| value).collect();
        assert_eq!(values, vec![Value::Token('a'), Value::Token('b')]);
    }

    #[test]
    fn test_record_snapshots_handlers_in_order() {
        let mut closure: Closure<char> =
            Closure::new(ParserId::from_index(0), 0, Position::new(), None);
        assert!(closure.register(Rc::new(Handler::Forward { target: 1 })).is_empty());
        assert!(closure.register(Rc::new(Handler::Just { target: 2 })).is_empty());

        let handlers = closure.record(Value::Unit, 0);
        let targets: Vec<_> = handlers.iter().map(|h| h.target()).collect();
        assert_eq!(targets, vec![Some(1), Some(2)]);
        assert_eq!(closure.handler_count(), 2);
        assert_eq!(closure.results().count(), 1);
    }

    #[test]
    fn test_later_results_delivered_but_not_kept() {
        let mut closure: Closure<char> =
            Closure::new(ParserId::from_index(0), 0, Position::new(), None);
        closure.register(Rc::new(Handler::Root));
        closure.record(Value::Token('a'), 0);

        assert_eq!(closure.record(Value::Token('b'), 1).len(), 1);
        assert_eq!(closure.results().count(), 1);

        closure.retire();
        assert_eq!(closure.results().count(), 0);
        assert_eq!(closure.record(Value::Token('c'), 2).len(), 1);
    }
}
