/// The result produced by a parser node.
///
/// Every node in a grammar reports values of this one type so that nodes of
/// different shapes can share an arena and a memo table. Combinators build
/// structure out of their children's values: a sequence yields a `List` with
/// one entry per child, an optional yields `Nothing` or `Just`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value<T> {
    /// The end-of-input sentinel, also handy as a unit success.
    Unit,
    /// A single input token.
    Token(T),
    /// Text assembled from character tokens.
    Text(String),
    /// An integer computed by a semantic action.
    Int(i64),
    /// The empty case of an optional parser.
    Nothing,
    /// The present case of an optional parser.
    Just(Box<Value<T>>),
    /// Sequences, repetitions and token runs.
    List(Vec<Value<T>>),
}

impl<T> Value<T> {
    /// Wraps a value as the present case of an optional.
    pub fn just(value: Value<T>) -> Self {
        Value::Just(Box::new(value))
    }

    /// Builds a list of token values.
    pub fn tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Value::List(tokens.into_iter().map(Value::Token).collect())
    }

    pub fn as_token(&self) -> Option<&T> {
        match self {
            Value::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value<T>]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<Value<T>>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the inner value of `Just`, `None` for `Nothing` and for
    /// values that are not optionals.
    pub fn as_just(&self) -> Option<&Value<T>> {
        match self {
            Value::Just(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Value::Nothing)
    }
}

impl Value<char> {
    /// Concatenates the characters of a token list into `Text`.
    ///
    /// Tokens nested in lists and text fragments are flattened in order;
    /// other variants contribute nothing.
    pub fn into_text(self) -> Value<char> {
        let mut text = String::new();
        collect_text(&self, &mut text);
        Value::Text(text)
    }
}

fn collect_text(value: &Value<char>, out: &mut String) {
    match value {
        Value::Token(c) => out.push(*c),
        Value::Text(s) => out.push_str(s),
        Value::List(items) => items.iter().for_each(|item| collect_text(item, out)),
        Value::Just(inner) => collect_text(inner, out),
        Value::Unit | Value::Int(_) | Value::Nothing => {}
    }
}
