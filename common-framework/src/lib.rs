//! Common Framework
//!
//! Components shared by the combinator engine and its hosts: token positions
//! and the incremental streaming signal protocol.

pub mod position;
pub mod streaming;

pub use position::{Position, Token};
pub use streaming::{Inbound, Outbound, StreamingSignal};
