/// Protocol-level signals exchanged between a token producer and an
/// incremental consumer.
///
/// The producer drives the exchange: it supplies tokens one at a time and
/// announces the end of input. The consumer answers with what it produced or
/// what it needs next.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamingSignal<Tok, Out> {
    /// Producer supplies the next token of the input.
    SupplyToken(Tok),
    /// Producer signals that no more tokens will arrive.
    EndOfInput,
    /// Consumer reports results that became available.
    Produced(Vec<Out>),
    /// Consumer is waiting for another token.
    NeedToken,
    /// Consumer has completed and emitted its remaining results.
    Finished(Vec<Out>),
    /// Consumer cannot continue, with a reason.
    Blocked(String),
}

/// Trait implemented by components that can **receive** streaming signals.
pub trait Inbound<Tok, Out> {
    fn handle_signal(&mut self, signal: StreamingSignal<Tok, Out>);
}

/// Trait implemented by components that can **emit** streaming signals.
///
/// Returns `None` once the component has nothing more to say.
pub trait Outbound<Tok, Out> {
    fn next_signal(&mut self) -> Option<StreamingSignal<Tok, Out>>;
}
