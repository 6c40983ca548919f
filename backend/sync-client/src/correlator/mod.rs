//! Response correlation.
//!
//! Two strategies are supported behind [`Correlator`]:
//!
//! - [`EchoedActionCorrelator`] (default) trusts the `action` label the
//!   helper echoes back. It needs no ordering assumption and copes with
//!   several request kinds in flight at once.
//! - [`FifoCorrelator`] ignores labels for matching and pairs each inbound
//!   message with the oldest unanswered request. If the helper ever reorders
//!   or drops a response, every later pairing is wrong; overlapping
//!   settings/status commands are the usual way to hit that.

mod echoed;
mod fifo;

pub use echoed::EchoedActionCorrelator;
pub use fifo::{FifoCorrelator, PendingQueue};

use crate::error::ProtocolError;
use crate::protocol::{InboundMessage, RequestKind};

use serde::{Deserialize, Serialize};

/// Which correlation strategy a session uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrategy {
    #[default]
    EchoedAction,
    Fifo,
}

/// Matches inbound messages to the requests that produced them.
pub trait Correlator: Send + Sync {
    fn strategy(&self) -> CorrelationStrategy;

    /// Record a request as sent. Called in send order, before the frame is
    /// written, and only for kinds that expect a reply.
    fn on_sent(&mut self, kind: RequestKind);

    /// Decide which request `message` answers.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the message cannot be matched; the
    /// caller logs and drops it.
    fn correlate(&mut self, message: &InboundMessage) -> Result<RequestKind, ProtocolError>;

    /// Number of sent-but-unanswered requests.
    fn outstanding(&self) -> usize;

    /// Abandon everything outstanding (teardown).
    fn clear(&mut self);
}

/// Build the correlator for a strategy.
pub fn for_strategy(strategy: CorrelationStrategy) -> Box<dyn Correlator> {
    match strategy {
        CorrelationStrategy::EchoedAction => Box::new(EchoedActionCorrelator::default()),
        CorrelationStrategy::Fifo => Box::new(FifoCorrelator::default()),
    }
}
