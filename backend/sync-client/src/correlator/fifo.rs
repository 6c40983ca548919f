use crate::correlator::{CorrelationStrategy, Correlator};
use crate::error::ProtocolError;
use crate::protocol::{InboundMessage, RequestKind};

use std::collections::VecDeque;

/// Request kinds awaiting a response, oldest first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingQueue {
    kinds: VecDeque<RequestKind>,
}

impl PendingQueue {
    pub fn push(&mut self, kind: RequestKind) {
        self.kinds.push_back(kind);
    }

    pub fn pop(&mut self) -> Option<RequestKind> {
        self.kinds.pop_front()
    }

    pub fn head(&self) -> Option<RequestKind> {
        self.kinds.front().copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn clear(&mut self) {
        self.kinds.clear();
    }
}

/// Pairs each inbound message with the oldest unanswered request.
///
/// Assumes the helper answers exactly once per request, in send order.
/// A label that contradicts the head still consumes the head.
#[derive(Debug, Default)]
pub struct FifoCorrelator {
    pending: PendingQueue,
}

impl FifoCorrelator {
    pub fn pending(&self) -> &PendingQueue {
        &self.pending
    }
}

impl Correlator for FifoCorrelator {
    fn strategy(&self) -> CorrelationStrategy {
        CorrelationStrategy::Fifo
    }

    fn on_sent(&mut self, kind: RequestKind) {
        self.pending.push(kind);
    }

    fn correlate(&mut self, message: &InboundMessage) -> Result<RequestKind, ProtocolError> {
        let head = self.pending.pop().ok_or_else(ProtocolError::nothing_pending)?;

        if let Some(label) = message.action() {
            if RequestKind::from_action(label) != Some(head) {
                return Err(ProtocolError::head_mismatch(head, label));
            }
        }

        Ok(head)
    }

    fn outstanding(&self) -> usize {
        self.pending.len()
    }

    fn clear(&mut self) {
        self.pending.clear();
    }
}
