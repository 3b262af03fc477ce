//! Grammar arena and parser construction API.
//!
//! A [`Grammar`] owns every parser node of a grammar. Nodes refer to each
//! other by [`ParserId`], which is also the identity the engine memoizes on:
//! requesting the same id twice at one position shares a single computation.
//! Combinators with identical structure are deduplicated on construction, so
//! `choice([a, b])` built twice yields the same id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::GrammarError;
use crate::value::Value;

/// Stable handle to a parser node inside a [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParserId(u32);

impl ParserId {
    /// # Panics
    ///
    /// Panics if `index` does not fit in the `u32` id space.
    pub(crate) fn from_index(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(raw) => Self(raw),
            Err(_) => panic!("parser index {index} exceeds the u32 id space"),
        }
    }

    /// Returns the arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
pub(crate) type Action<T> = Arc<dyn Fn(Value<T>) -> Option<Value<T>> + Send + Sync>;

/// A labelled token predicate.
pub(crate) struct TokenFilter<T> {
    label: String,
    predicate: Predicate<T>,
}

impl<T> TokenFilter<T> {
    pub(crate) fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub(crate) fn accepts(&self, token: &T) -> bool {
        (self.predicate)(token)
    }
}

impl<T> fmt::Debug for TokenFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TokenFilter").field(&self.label).finish()
    }
}

pub(crate) enum Node<T> {
    Success(Value<T>),
    Failure,
    EndOfInput,
    Filter {
        filter: TokenFilter<T>,
        accept_end: bool,
    },
    Literal {
        tokens: Vec<T>,
        eq: fn(&T, &T) -> bool,
    },
    Span {
        filter: TokenFilter<T>,
        min: usize,
        max: Option<usize>,
    },
    Sequence(Vec<ParserId>),
    Choice(Vec<ParserId>),
    Many {
        item: ParserId,
        min: usize,
        max: Option<usize>,
    },
    Optional(ParserId),
    Map {
        inner: ParserId,
        action: Action<T>,
    },
    Rule(Option<ParserId>),
}

impl<T> Node<T> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Node::Success(_) => "success",
            Node::Failure => "failure",
            Node::EndOfInput => "end-of-input",
            Node::Filter { .. } => "filter",
            Node::Literal { .. } => "literal",
            Node::Span { .. } => "span",
            Node::Sequence(_) => "sequence",
            Node::Choice(_) => "choice",
            Node::Many { .. } => "many",
            Node::Optional(_) => "optional",
            Node::Map { .. } => "map",
            Node::Rule(_) => "rule",
        }
    }

    fn children(&self) -> Vec<ParserId> {
        match self {
            Node::Sequence(items) | Node::Choice(items) => items.clone(),
            Node::Many { item, .. } | Node::Optional(item) => vec![*item],
            Node::Map { inner, .. } => vec![*inner],
            Node::Rule(target) => target.iter().copied().collect(),
            _ => Vec::new(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Success(value) => f.debug_tuple("Success").field(value).finish(),
            Node::Filter { filter, accept_end } => f
                .debug_struct("Filter")
                .field("label", &filter.label)
                .field("accept_end", accept_end)
                .finish(),
            Node::Literal { tokens, .. } => f.debug_tuple("Literal").field(tokens).finish(),
            Node::Span { filter, min, max } => f
                .debug_struct("Span")
                .field("label", &filter.label)
                .field("min", min)
                .field("max", max)
                .finish(),
            Node::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Node::Choice(items) => f.debug_tuple("Choice").field(items).finish(),
            Node::Many { item, min, max } => f
                .debug_struct("Many")
                .field("item", item)
                .field("min", min)
                .field("max", max)
                .finish(),
            Node::Optional(item) => f.debug_tuple("Optional").field(item).finish(),
            Node::Map { inner, .. } => f.debug_tuple("Map").field(inner).finish(),
            Node::Rule(target) => f.debug_tuple("Rule").field(target).finish(),
            Node::Failure | Node::EndOfInput => f.write_str(self.kind()),
        }
    }
}

/// Structural key used to deduplicate combinators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Shape {
    Failure,
    EndOfInput,
    Sequence(Vec<ParserId>),
    Choice(Vec<ParserId>),
    Many(ParserId, usize, Option<usize>),
    Optional(ParserId),
}

/// An immutable-once-built collection of parser nodes.
///
/// A grammar holds at most `u32::MAX + 1` nodes; the builder methods panic
/// when asked to add more.
pub struct Grammar<T> {
    nodes: Vec<Node<T>>,
    shapes: HashMap<Shape, ParserId>,
}

impl<T> Default for Grammar<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Grammar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.nodes
                    .iter()
                    .enumerate()
                    .map(|(i, node)| (ParserId::from_index(i), node)),
            )
            .finish()
    }
}

impl<T> Grammar<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            shapes: HashMap::new(),
        }
    }

    /// Returns the number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns a short name for the kind of node `id` is.
    pub fn kind(&self, id: ParserId) -> Option<&'static str> {
        self.nodes.get(id.index()).map(Node::kind)
    }

    pub(crate) fn node(&self, id: ParserId) -> Option<&Node<T>> {
        self.nodes.get(id.index())
    }

    fn push(&mut self, node: Node<T>) -> ParserId {
        let id = ParserId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn intern(&mut self, shape: Shape, node: Node<T>) -> ParserId {
        if let Some(&id) = self.shapes.get(&shape) {
            return id;
        }
        let id = self.push(node);
        self.shapes.insert(shape, id);
        id
    }

    /// Succeeds immediately with `value`.
    pub fn success(&mut self, value: Value<T>) -> ParserId {
        self.push(Node::Success(value))
    }

    /// Never succeeds.
    pub fn failure(&mut self) -> ParserId {
        self.intern(Shape::Failure, Node::Failure)
    }

    /// Succeeds with [`Value::Unit`] at the end of input and nowhere else.
    pub fn end_of_input(&mut self) -> ParserId {
        self.intern(Shape::EndOfInput, Node::EndOfInput)
    }

    /// Matches one token accepted by `predicate`.
    pub fn token<F>(&mut self, label: impl Into<String>, predicate: F) -> ParserId
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.push(Node::Filter {
            filter: TokenFilter::new(label, predicate),
            accept_end: false,
        })
    }

    /// Like [`Grammar::token`], but also succeeds with [`Value::Unit`] when
    /// the input ends instead of supplying a token.
    pub fn token_or_end<F>(&mut self, label: impl Into<String>, predicate: F) -> ParserId
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.push(Node::Filter {
            filter: TokenFilter::new(label, predicate),
            accept_end: true,
        })
    }

    /// Matches a run of tokens accepted by `predicate`, reporting the run at
    /// every length from `min` up to `max`.
    pub fn span<F>(
        &mut self,
        label: impl Into<String>,
        predicate: F,
        min: usize,
        max: Option<usize>,
    ) -> ParserId
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.push(Node::Span {
            filter: TokenFilter::new(label, predicate),
            min,
            max,
        })
    }

    /// Runs `items` one after another, reporting a `List` of their values.
    pub fn sequence<I>(&mut self, items: I) -> ParserId
    where
        I: IntoIterator<Item = ParserId>,
    {
        let items: Vec<_> = items.into_iter().collect();
        self.intern(Shape::Sequence(items.clone()), Node::Sequence(items))
    }

    /// Reports every result of every alternative.
    pub fn choice<I>(&mut self, items: I) -> ParserId
    where
        I: IntoIterator<Item = ParserId>,
    {
        let items: Vec<_> = items.into_iter().collect();
        self.intern(Shape::Choice(items.clone()), Node::Choice(items))
    }

    /// Repeats `item` between `min` and `max` times (`None` is unbounded),
    /// reporting a `List` for every reachable count.
    pub fn many(&mut self, item: ParserId, min: usize, max: Option<usize>) -> ParserId {
        self.intern(
            Shape::Many(item, min, max),
            Node::Many { item, min, max },
        )
    }

    /// Reports `Nothing`, and `Just(v)` for every result `v` of `item`.
    pub fn optional(&mut self, item: ParserId) -> ParserId {
        self.intern(Shape::Optional(item), Node::Optional(item))
    }

    /// Transforms every result of `inner`.
    pub fn map<F>(&mut self, inner: ParserId, f: F) -> ParserId
    where
        F: Fn(Value<T>) -> Value<T> + Send + Sync + 'static,
    {
        self.push(Node::Map {
            inner,
            action: Arc::new(move |value| Some(f(value))),
        })
    }

    /// Transforms every result of `inner`, dropping those mapped to `None`.
    pub fn filter_map<F>(&mut self, inner: ParserId, f: F) -> ParserId
    where
        F: Fn(Value<T>) -> Option<Value<T>> + Send + Sync + 'static,
    {
        self.push(Node::Map {
            inner,
            action: Arc::new(f),
        })
    }

    /// Declares a rule whose body is supplied later with [`Grammar::define`].
    /// Rules make recursive grammars possible.
    pub fn rule(&mut self) -> ParserId {
        self.push(Node::Rule(None))
    }

    /// Gives a declared rule its body.
    pub fn define(&mut self, rule: ParserId, body: ParserId) -> Result<(), GrammarError> {
        if body.index() >= self.nodes.len() {
            return Err(GrammarError::UnknownParser(body));
        }
        match self.nodes.get_mut(rule.index()) {
            Some(Node::Rule(target)) => match target {
                Some(_) => Err(GrammarError::Redefined(rule)),
                None => {
                    *target = Some(body);
                    Ok(())
                }
            },
            Some(_) => Err(GrammarError::NotARule(rule)),
            None => Err(GrammarError::UnknownParser(rule)),
        }
    }

    /// Checks that the grammar reachable from `root` can be run.
    pub fn validate(&self, root: ParserId) -> Result<(), GrammarError> {
        if root.index() >= self.nodes.len() {
            return Err(GrammarError::UnknownParser(root));
        }
        for node in &self.nodes {
            if let Some(&bad) = node
                .children()
                .iter()
                .find(|child| child.index() >= self.nodes.len())
            {
                return Err(GrammarError::UnknownParser(bad));
            }
        }

        let nullable = self.nullable();
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            let node = &self.nodes[id.index()];
            match node {
                Node::Rule(None) => return Err(GrammarError::UndefinedRule(id)),
                Node::Many { item, min, max } => {
                    check_bounds(id, *min, *max)?;
                    if max.is_none() && nullable[item.index()] {
                        return Err(GrammarError::NullableRepetition(id));
                    }
                }
                Node::Span { min, max, .. } => check_bounds(id, *min, *max)?,
                _ => {}
            }
            stack.extend(node.children());
        }
        Ok(())
    }

    /// Computes which nodes can succeed without consuming a token.
    ///
    /// End of input counts as zero-width. Map actions are assumed to keep
    /// their input's results.
    fn nullable(&self) -> Vec<bool> {
        let mut nullable = vec![false; self.nodes.len()];
        loop {
            let mut changed = false;
            for (i, node) in self.nodes.iter().enumerate() {
                if nullable[i] {
                    continue;
                }
                let is_nullable = match node {
                    Node::Success(_) | Node::EndOfInput | Node::Optional(_) => true,
                    Node::Failure => false,
                    Node::Filter { accept_end, .. } => *accept_end,
                    Node::Literal { tokens, .. } => tokens.is_empty(),
                    Node::Span { min, .. } => *min == 0,
                    Node::Sequence(items) => items.iter().all(|id| nullable[id.index()]),
                    Node::Choice(items) => items.iter().any(|id| nullable[id.index()]),
                    Node::Many { item, min, .. } => *min == 0 || nullable[item.index()],
                    Node::Map { inner, .. } => nullable[inner.index()],
                    Node::Rule(target) => target.is_some_and(|id| nullable[id.index()]),
                };
                if is_nullable {
                    nullable[i] = true;
                    changed = true;
                }
            }
            if !changed {
                return nullable;
            }
        }
    }
}

impl<T: PartialEq> Grammar<T> {
    /// Matches exactly `tokens`, reporting them as a `List`.
    pub fn literal<I>(&mut self, tokens: I) -> ParserId
    where
        I: IntoIterator<Item = T>,
    {
        self.push(Node::Literal {
            tokens: tokens.into_iter().collect(),
            eq: <T as PartialEq>::eq,
        })
    }
}

fn check_bounds(id: ParserId, min: usize, max: Option<usize>) -> Result<(), GrammarError> {
    match max {
        Some(max) if min > max => Err(GrammarError::InvalidBounds { id, min, max }),
        _ => Ok(()),
    }
}
