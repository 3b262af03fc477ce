//! The incremental parse runtime.
//!
//! A [`Session`] owns every closure of one parse and the [`ParseState`] of
//! the current token boundary. Work is never done by direct recursion:
//! registering a handler, running a node and recording a result are tasks on
//! a FIFO queue. Anything a delivery asks for (new registrations, new
//! results, new node runs) is appended to the queue and happens after that
//! delivery completes, so no closure is mutated while its results or
//! handlers are being walked.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::rc::Rc;

use common_framework::{Position, Token};
use tracing::{debug, trace};

use crate::closure::{Closure, ClosureId, Handler, StepIndex};
use crate::continuation::{Continuation, Input};
use crate::engine::EngineOptions;
use crate::error::{EngineError, GrammarError};
use crate::grammar::{Grammar, Node, ParserId};
use crate::state::ParseState;
use crate::value::Value;

/// One successful parse of the root parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<T> {
    pub value: Value<T>,
    /// Position right after the last token the match consumed.
    pub position: Position,
}

/// Counters describing a finished or running parse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseSummary {
    /// Tokens fed to the parse.
    pub tokens: usize,
    /// Closures created, one per (parser, position) pair visited.
    pub closures: usize,
    /// Results delivered for the root parser.
    pub results: usize,
    node_runs: Vec<usize>,
}

impl ParseSummary {
    /// How many times parser `id` was run across all positions.
    pub fn runs(&self, id: ParserId) -> usize {
        self.node_runs.get(id.index()).copied().unwrap_or(0)
    }
}

#[derive(Debug)]
enum Task<T> {
    Register {
        closure: ClosureId,
        handler: Rc<Handler<T>>,
    },
    Run {
        closure: ClosureId,
    },
    Report {
        closure: ClosureId,
        value: Value<T>,
    },
}

/// A parse that is fed one token at a time.
pub struct Session<'g, T> {
    grammar: &'g Grammar<T>,
    options: EngineOptions,
    closures: Vec<Closure<T>>,
    /// First closure created at the current step.
    step_start: ClosureId,
    tasks: VecDeque<Task<T>>,
    state: ParseState<T>,
    matches: Vec<Match<T>>,
    node_runs: Vec<usize>,
    step_tasks: usize,
    tokens: usize,
    results: usize,
    finished: bool,
}

impl<'g, T> Session<'g, T>
where
    T: Token + Clone + Debug,
{
    /// Starts parsing `root` at `start` with default options.
    pub fn new(grammar: &'g Grammar<T>, root: ParserId, start: Position) -> Result<Self, EngineError> {
        Self::with_options(grammar, root, start, EngineOptions::default())
    }

    /// Starts parsing `root` at `start`.
    ///
    /// The grammar is validated first. Results the root parser produces
    /// before any token is consumed are available from
    /// [`Session::take_matches`].
    pub fn with_options(
        grammar: &'g Grammar<T>,
        root: ParserId,
        start: Position,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        grammar.validate(root)?;
        debug!(%root, nodes = grammar.len(), position = %start, "starting parse");

        let mut session = Self {
            grammar,
            options,
            closures: Vec::new(),
            step_start: 0,
            tasks: VecDeque::new(),
            state: ParseState::new(0, start),
            matches: Vec::new(),
            node_runs: vec![0; grammar.len()],
            step_tasks: 0,
            tokens: 0,
            results: 0,
            finished: false,
        };
        session.parse(root, Handler::Root, None)?;
        session.drain()?;
        Ok(session)
    }

    /// Returns true while some continuation is waiting for input.
    pub fn is_live(&self) -> bool {
        !self.finished && self.state.has_continuations()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Position of the current token boundary.
    pub fn position(&self) -> Position {
        self.state.position()
    }

    /// Feeds the next token and returns the root matches it completed.
    ///
    /// A token pushed while nothing is waiting for input is ignored.
    pub fn push_token(&mut self, token: T) -> Result<Vec<Match<T>>, EngineError> {
        if self.finished {
            return Err(EngineError::Finished);
        }
        if !self.state.has_continuations() {
            trace!(position = %self.state.position(), "no pending continuations, token ignored");
            return Ok(self.take_matches());
        }

        let pending = self.state.take_continuations();
        for closure in &mut self.closures[self.step_start..] {
            closure.retire();
        }
        self.step_start = self.closures.len();
        self.state = self.state.advance(&token);
        self.tokens += 1;
        self.step_tasks = 0;
        debug!(
            step = self.state.step(),
            position = %self.state.position(),
            pending = pending.len(),
            "feeding token"
        );

        for continuation in pending {
            self.resume(continuation, Input::Token(&token))?;
            self.drain()?;
        }
        Ok(self.take_matches())
    }

    /// Signals the end of input and returns the root matches it completed.
    ///
    /// Continuations that nodes register while reacting to the end of input
    /// are fed the end of input too, until none are left.
    pub fn finish(&mut self) -> Result<Vec<Match<T>>, EngineError> {
        if self.finished {
            return Err(EngineError::Finished);
        }
        self.finished = true;
        self.step_tasks = 0;

        loop {
            let pending = self.state.take_continuations();
            if pending.is_empty() {
                break;
            }
            debug!(
                step = self.state.step(),
                pending = pending.len(),
                "feeding end of input"
            );
            for continuation in pending {
                self.resume(continuation, Input::End)?;
                self.drain()?;
            }
        }
        debug!(
            tokens = self.tokens,
            closures = self.closures.len(),
            results = self.results,
            "parse finished"
        );
        Ok(self.take_matches())
    }

    /// Returns the root matches produced since the last call.
    pub fn take_matches(&mut self) -> Vec<Match<T>> {
        std::mem::take(&mut self.matches)
    }

    pub fn summary(&self) -> ParseSummary {
        ParseSummary {
            tokens: self.tokens,
            closures: self.closures.len(),
            results: self.results,
            node_runs: self.node_runs.clone(),
        }
    }

    /// Resolves the closure for `node` at the current position and
    /// registers `handler` on it, running the node if it is new here.
    fn parse(
        &mut self,
        node: ParserId,
        handler: Handler<T>,
        parent: Option<ClosureId>,
    ) -> Result<(), EngineError> {
        let handler = Rc::new(handler);
        let step = self.state.step();

        if let Some(closure) = self.state.lookup(node) {
            let existing = self.closure(closure)?;
            if existing.node != node || existing.step != step {
                return Err(EngineError::Internal(format!(
                    "memo for {node} at step {step} points at closure {closure} of {} at step {}",
                    existing.node, existing.step
                )));
            }
            self.tasks.push_back(Task::Register { closure, handler });
            return Ok(());
        }

        let closure = self.closures.len();
        self.closures
            .push(Closure::new(node, step, self.state.position(), parent));
        self.state.remember(node, closure);
        trace!(
            %node,
            kind = self.grammar.kind(node).unwrap_or("?"),
            closure,
            ?parent,
            position = %self.state.position(),
            "new closure"
        );
        self.tasks.push_back(Task::Register { closure, handler });
        self.tasks.push_back(Task::Run { closure });
        Ok(())
    }

    fn report(&mut self, closure: ClosureId, value: Value<T>) {
        self.tasks.push_back(Task::Report { closure, value });
    }

    fn drain(&mut self) -> Result<(), EngineError> {
        while let Some(task) = self.tasks.pop_front() {
            self.charge()?;
            match task {
                Task::Register { closure, handler } => {
                    let replay = self.closure_mut(closure)?.register(Rc::clone(&handler));
                    for (value, step) in replay {
                        self.deliver(&handler, value, step)?;
                    }
                }
                Task::Run { closure } => self.run(closure)?,
                Task::Report { closure, value } => {
                    let step = self.state.step();
                    let handlers = self.closure_mut(closure)?.record(value.clone(), step);
                    for handler in handlers {
                        self.deliver(&handler, value.clone(), step)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn charge(&mut self) -> Result<(), EngineError> {
        self.step_tasks += 1;
        match self.options.step_budget {
            Some(budget) if self.step_tasks > budget => {
                self.finished = true;
                self.tasks.clear();
                Err(EngineError::BudgetExhausted {
                    index: self.state.step(),
                    budget,
                })
            }
            _ => Ok(()),
        }
    }

    /// Routes one result, recorded at `step`, through `handler`.
    fn deliver(&mut self, handler: &Handler<T>, value: Value<T>, step: StepIndex) -> Result<(), EngineError> {
        if step != self.state.step() {
            return Err(EngineError::Internal(format!(
                "result from step {step} delivered during step {}",
                self.state.step()
            )));
        }

        match handler {
            Handler::Root => {
                let position = self.state.position();
                trace!(?value, %position, "root result");
                self.results += 1;
                self.matches.push(Match { value, position });
            }
            Handler::Forward { target } => self.report(*target, value),
            Handler::Just { target } => self.report(*target, Value::just(value)),
            Handler::Map { target, node } => {
                let Node::Map { action, .. } = self.node(*node)? else {
                    return Err(mismatch(*node, "map"));
                };
                if let Some(mapped) = action(value) {
                    self.report(*target, mapped);
                }
            }
            Handler::Sequence {
                target,
                node,
                next,
                acc,
            } => {
                let mut acc = acc.clone();
                acc.push(value);
                self.continue_sequence(*target, *node, *next, acc)?;
            }
            Handler::Repeat {
                target,
                node,
                count,
                acc,
            } => {
                let mut acc = acc.clone();
                acc.push(value);
                self.continue_repeat(*target, *node, count + 1, acc)?;
            }
        }
        Ok(())
    }

    /// Runs the node of a freshly created closure at the current position.
    fn run(&mut self, closure: ClosureId) -> Result<(), EngineError> {
        let (id, parent) = {
            let entry = self.closure(closure)?;
            (entry.node, entry.parent)
        };
        trace!(%id, closure, ?parent, "running node");
        if let Some(runs) = self.node_runs.get_mut(id.index()) {
            *runs += 1;
        }

        match self.node(id)? {
            Node::Success(value) => self.report(closure, value.clone()),
            Node::Failure => {}
            Node::EndOfInput => self
                .state
                .read(Continuation::EndOfInput { target: closure }),
            Node::Filter { .. } => self.state.read(Continuation::Filter {
                target: closure,
                node: id,
            }),
            Node::Literal { tokens, .. } => {
                if tokens.is_empty() {
                    self.report(closure, Value::List(Vec::new()));
                } else {
                    self.state.read(Continuation::Literal {
                        target: closure,
                        node: id,
                        matched: 0,
                    });
                }
            }
            Node::Span { .. } => self.continue_span(closure, id, Vec::new())?,
            Node::Sequence(_) => self.continue_sequence(closure, id, 0, Vec::new())?,
            Node::Choice(items) => {
                for &item in items {
                    self.parse(item, Handler::Forward { target: closure }, Some(closure))?;
                }
            }
            Node::Many { .. } => self.continue_repeat(closure, id, 0, Vec::new())?,
            Node::Optional(item) => {
                self.report(closure, Value::Nothing);
                self.parse(*item, Handler::Just { target: closure }, Some(closure))?;
            }
            Node::Map { inner, .. } => {
                self.parse(
                    *inner,
                    Handler::Map {
                        target: closure,
                        node: id,
                    },
                    Some(closure),
                )?;
            }
            Node::Rule(body) => {
                let body = body.ok_or(GrammarError::UndefinedRule(id))?;
                self.parse(body, Handler::Forward { target: closure }, Some(closure))?;
            }
        }
        Ok(())
    }

    /// Hands a token or the end of input to a waiting continuation.
    fn resume(&mut self, continuation: Continuation<T>, input: Input<'_, T>) -> Result<(), EngineError> {
        let target = continuation.target();
        let origin = self.closure(target)?.position;
        trace!(
            target,
            %origin,
            end = matches!(input, Input::End),
            "resuming continuation"
        );

        match continuation {
            Continuation::EndOfInput { target } => {
                if let Input::End = input {
                    self.report(target, Value::Unit);
                }
            }
            Continuation::Filter { target, node } => {
                let Node::Filter { filter, accept_end } = self.node(node)? else {
                    return Err(mismatch(node, "filter"));
                };
                match input {
                    Input::Token(token) if filter.accepts(token) => {
                        self.report(target, Value::Token(token.clone()));
                    }
                    Input::End if *accept_end => self.report(target, Value::Unit),
                    _ => {}
                }
            }
            Continuation::Span {
                target,
                node,
                mut acc,
            } => {
                let Node::Span { filter, .. } = self.node(node)? else {
                    return Err(mismatch(node, "span"));
                };
                if let Input::Token(token) = input {
                    if filter.accepts(token) {
                        acc.push(token.clone());
                        self.continue_span(target, node, acc)?;
                    }
                }
            }
            Continuation::Literal {
                target,
                node,
                matched,
            } => {
                let Node::Literal { tokens, eq } = self.node(node)? else {
                    return Err(mismatch(node, "literal"));
                };
                if let Input::Token(token) = input {
                    match tokens.get(matched) {
                        Some(expected) if eq(expected, token) => {
                            let matched = matched + 1;
                            if matched == tokens.len() {
                                self.report(target, Value::tokens(tokens.iter().cloned()));
                            } else {
                                self.state.read(Continuation::Literal {
                                    target,
                                    node,
                                    matched,
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    fn continue_sequence(
        &mut self,
        target: ClosureId,
        node: ParserId,
        next: usize,
        acc: Vec<Value<T>>,
    ) -> Result<(), EngineError> {
        let Node::Sequence(items) = self.node(node)? else {
            return Err(mismatch(node, "sequence"));
        };
        match items.get(next) {
            None => self.report(target, Value::List(acc)),
            Some(&item) => {
                let handler = Handler::Sequence {
                    target,
                    node,
                    next: next + 1,
                    acc,
                };
                self.parse(item, handler, Some(target))?;
            }
        }
        Ok(())
    }

    /// Reports `acc` if `count` reaches the lower bound and asks for one more
    /// item while the upper bound allows it.
    fn continue_repeat(
        &mut self,
        target: ClosureId,
        node: ParserId,
        count: usize,
        acc: Vec<Value<T>>,
    ) -> Result<(), EngineError> {
        let Node::Many { item, min, max } = self.node(node)? else {
            return Err(mismatch(node, "many"));
        };
        if count >= *min {
            self.report(target, Value::List(acc.clone()));
        }
        if max.map_or(true, |max| count < max) {
            let handler = Handler::Repeat {
                target,
                node,
                count,
                acc,
            };
            self.parse(*item, handler, Some(target))?;
        }
        Ok(())
    }

    fn continue_span(&mut self, target: ClosureId, node: ParserId, acc: Vec<T>) -> Result<(), EngineError> {
        let Node::Span { min, max, .. } = self.node(node)? else {
            return Err(mismatch(node, "span"));
        };
        if acc.len() >= *min {
            self.report(target, Value::tokens(acc.iter().cloned()));
        }
        if max.map_or(true, |max| acc.len() < max) {
            self.state.read(Continuation::Span { target, node, acc });
        }
        Ok(())
    }

    fn node(&self, id: ParserId) -> Result<&'g Node<T>, EngineError> {
        let grammar = self.grammar;
        grammar
            .node(id)
            .ok_or_else(|| EngineError::Internal(format!("parser {id} missing from grammar")))
    }

    fn closure(&self, id: ClosureId) -> Result<&Closure<T>, EngineError> {
        self.closures
            .get(id)
            .ok_or_else(|| EngineError::Internal(format!("closure {id} does not exist")))
    }

    fn closure_mut(&mut self, id: ClosureId) -> Result<&mut Closure<T>, EngineError> {
        self.closures
            .get_mut(id)
            .ok_or_else(|| EngineError::Internal(format!("closure {id} does not exist")))
    }
}

impl<T: Debug> Debug for Session<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("position", &self.state.position())
            .field("closures", &self.closures.len())
            .field("queued", &self.tasks.len())
            .field("finished", &self.finished)
            .finish()
    }
}

fn mismatch(node: ParserId, expected: &str) -> EngineError {
    EngineError::Internal(format!("parser {node} is not a {expected} node"))
}
