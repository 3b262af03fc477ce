use std::collections::VecDeque;
use std::fmt::Debug;

use common_framework::{Inbound, Outbound, StreamingSignal, Token};

use crate::session::{Match, Session};

/// Adapts a [`Session`] to the streaming signal protocol.
///
/// Inbound `SupplyToken` and `EndOfInput` signals drive the session; the
/// outbound side reports produced matches, asks for tokens while the parse
/// is live, and ends with a single `Finished` or `Blocked` signal.
#[derive(Debug)]
pub struct StreamingSession<'g, T> {
    session: Session<'g, T>,
    outbox: VecDeque<StreamingSignal<T, Match<T>>>,
    closed: bool,
}

impl<'g, T> StreamingSession<'g, T>
where
    T: Token + Clone + Debug,
{
    pub fn new(mut session: Session<'g, T>) -> Self {
        let mut outbox = VecDeque::new();
        let produced = session.take_matches();
        if !produced.is_empty() {
            outbox.push_back(StreamingSignal::Produced(produced));
        }
        Self {
            session,
            outbox,
            closed: false,
        }
    }

    pub fn session(&self) -> &Session<'g, T> {
        &self.session
    }

    fn block(&mut self, reason: String) {
        self.outbox.push_back(StreamingSignal::Blocked(reason));
        self.closed = true;
    }
}

impl<T> Inbound<T, Match<T>> for StreamingSession<'_, T>
where
    T: Token + Clone + Debug,
{
    fn handle_signal(&mut self, signal: StreamingSignal<T, Match<T>>) {
        if self.closed {
            return;
        }
        match signal {
            StreamingSignal::SupplyToken(token) => match self.session.push_token(token) {
                Ok(produced) if !produced.is_empty() => {
                    self.outbox.push_back(StreamingSignal::Produced(produced));
                }
                Ok(_) => {}
                Err(err) => self.block(err.to_string()),
            },
            StreamingSignal::EndOfInput => match self.session.finish() {
                Ok(produced) => {
                    self.outbox.push_back(StreamingSignal::Finished(produced));
                    self.closed = true;
                }
                Err(err) => self.block(err.to_string()),
            },
            _ => {}
        }
    }
}

impl<T> Outbound<T, Match<T>> for StreamingSession<'_, T>
where
    T: Token + Clone + Debug,
{
    fn next_signal(&mut self) -> Option<StreamingSignal<T, Match<T>>> {
        if let Some(signal) = self.outbox.pop_front() {
            return Some(signal);
        }
        if self.closed {
            return None;
        }
        if self.session.is_live() {
            Some(StreamingSignal::NeedToken)
        } else {
            // Nothing can match any more; wrap up without waiting for input.
            self.handle_signal(StreamingSignal::EndOfInput);
            self.outbox.pop_front()
        }
    }
}
