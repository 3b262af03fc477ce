//! Incremental, continuation-based parser combinators.
//!
//! A grammar is built once in a [`Grammar`] arena and can then be run by any
//! number of independent parses. A parse consumes its input one token at a
//! time: nodes that need a token register a continuation and return, and the
//! [`Engine`] resumes them when the token arrives. Every node is run at most
//! once per input position, with its results shared by everything that asks
//! for it there, and every node may succeed more than once, so ambiguous
//! grammars report all of their derivations.
//!
//! ```
//! use combinator_framework::{Engine, Grammar, Value};
//!
//! let mut grammar = Grammar::new();
//! let digit = grammar.digit();
//! let pair = grammar.sequence([digit, digit]);
//!
//! let matches = Engine::new(&grammar).parse_all(pair, "12".chars()).unwrap();
//! assert_eq!(matches.len(), 1);
//! assert_eq!(
//!     matches[0].value,
//!     Value::List(vec![Value::Token('1'), Value::Token('2')])
//! );
//! assert_eq!(matches[0].position.index, 2);
//! ```

mod closure;
mod continuation;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod session;
mod state;
#[cfg(feature = "streaming")]
pub mod streaming;
mod text;
pub mod value;

pub use common_framework::{Position, Token};
pub use engine::{Engine, EngineOptions, ResultMode};
pub use error::{EngineError, GrammarError};
pub use grammar::{Grammar, ParserId};
pub use session::{Match, ParseSummary, Session};
#[cfg(feature = "streaming")]
pub use streaming::StreamingSession;
pub use value::Value;
