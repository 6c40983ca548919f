use crate::correlator::{CorrelationStrategy, Correlator};
use crate::error::ProtocolError;
use crate::protocol::{InboundMessage, RequestKind};

use std::collections::HashMap;

use log::warn;

/// Correlates on the echoed `action` label.
///
/// Outstanding counts per kind are kept for diagnostics only; they never
/// decide whether a response is accepted.
#[derive(Debug, Default)]
pub struct EchoedActionCorrelator {
    outstanding: HashMap<RequestKind, usize>,
}

impl Correlator for EchoedActionCorrelator {
    fn strategy(&self) -> CorrelationStrategy {
        CorrelationStrategy::EchoedAction
    }

    fn on_sent(&mut self, kind: RequestKind) {
        *self.outstanding.entry(kind).or_default() += 1;
    }

    fn correlate(&mut self, message: &InboundMessage) -> Result<RequestKind, ProtocolError> {
        let label = message
            .action()
            .ok_or_else(|| ProtocolError::malformed("response has no action label"))?;

        let kind =
            RequestKind::from_action(label).ok_or_else(|| ProtocolError::unexpected_action(label))?;

        match self.outstanding.get_mut(&kind) {
            Some(count) if *count > 0 => *count -= 1,
            _ => warn!("Response for '{kind}' arrived with no matching request outstanding"),
        }

        Ok(kind)
    }

    fn outstanding(&self) -> usize {
        self.outstanding.values().sum()
    }

    fn clear(&mut self) {
        self.outstanding.clear();
    }
}
