//! Subscriber-facing wait handle.
//!
//! [`WaitHandle`] represents one pending long-poll: it resolves to at most
//! one envelope, ever. Dropping the handle cancels the wait and removes
//! the waiter from the registry, so a transport layer that abandons the
//! request (client disconnect, upstream timeout) needs no extra
//! bookkeeping — the abort path *is* the drop.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::envelope::Envelope;
use crate::registry::{WaiterId, WaiterRegistry};

// ---------------------------------------------------------------------------
// WaitError
// ---------------------------------------------------------------------------

/// Errors from waiting on a subscription.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// The waiter was removed before any delivery reached it.
    #[error("wait cancelled before delivery")]
    Cancelled,
}

// ---------------------------------------------------------------------------
// WaitHandle
// ---------------------------------------------------------------------------

/// One pending long-poll wait.
///
/// Returned by
/// [`NotificationDispatcher::subscribe`](crate::dispatch::NotificationDispatcher::subscribe).
/// The transport awaits [`recv`](Self::recv); the broker completes the
/// wait when a publish claims this waiter. Delivery, explicit
/// [`cancel`](Self::cancel), and drop all resolve the same single claim,
/// so the waiter is consumed exactly once whichever happens first.
pub struct WaitHandle {
    /// Private channel id this wait belongs to.
    channel: String,
    /// Public pseudonym derived for the channel.
    pseudonym: String,
    /// Waiter id within the registry.
    id: WaiterId,
    /// Receiving half of the one-shot delivery slot.
    receiver: oneshot::Receiver<Arc<Envelope>>,
    /// Registry reference for cancellation.
    registry: Arc<WaiterRegistry>,
    /// Whether the wait already ended (delivered or cancelled).
    finished: bool,
}

impl WaitHandle {
    pub(crate) fn new(
        channel: String,
        pseudonym: String,
        id: WaiterId,
        receiver: oneshot::Receiver<Arc<Envelope>>,
        registry: Arc<WaiterRegistry>,
    ) -> Self {
        Self {
            channel,
            pseudonym,
            id,
            receiver,
            registry,
            finished: false,
        }
    }

    /// The public pseudonym for this wait's channel — safe to hand to
    /// publishers.
    #[must_use]
    pub fn pseudonym(&self) -> &str {
        &self.pseudonym
    }

    /// The registry id of this wait's waiter.
    #[must_use]
    pub fn id(&self) -> WaiterId {
        self.id
    }

    /// Waits for the envelope.
    ///
    /// Resolves when a publish claims this waiter. There is no timeout
    /// here — bounding the wait is the transport layer's policy.
    ///
    /// # Errors
    ///
    /// [`WaitError::Cancelled`] if the waiter was removed (explicit
    /// cancellation) before any delivery, or on a second call after the
    /// wait already ended.
    pub async fn recv(&mut self) -> Result<Arc<Envelope>, WaitError> {
        let result = (&mut self.receiver).await;
        self.finished = true;
        result.map_err(|_| WaitError::Cancelled)
    }

    /// Cancels the wait and removes the waiter from the registry.
    ///
    /// Idempotent: cancelling twice, or after a delivery already claimed
    /// the waiter, has no effect.
    pub fn cancel(&mut self) {
        if !self.finished {
            self.finished = true;
            self.registry.cancel(&self.channel, self.id);
        }
    }

    /// Returns `true` once the wait has ended (delivered or cancelled).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for WaitHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
