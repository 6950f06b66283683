//! Waiter registry — pending long-poll connections, per channel.
//!
//! Each waiter is the sender half of a one-shot channel bound to one open
//! long-poll connection; sending on it is the single atomic claim step, so
//! a waiter can never be both delivered to and reported dead.
//! [`WaiterRegistry::dispatch_one`] claims waiters newest-first and falls
//! through past dead ones until a send lands or the sequence is exhausted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fxhash::FxHashMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::envelope::Envelope;

// ---------------------------------------------------------------------------
// WaiterId
// ---------------------------------------------------------------------------

/// Unique waiter identifier.
///
/// Monotonically assigned by [`WaiterRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaiterId(pub u64);

impl fmt::Display for WaiterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "waiter-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// DeliveryOutcome
// ---------------------------------------------------------------------------

/// Result of one dispatch pass over a channel's waiter sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Whether a live waiter claimed the envelope.
    pub delivered: bool,
    /// Waiters discarded because their connection was already gone.
    pub dead_discarded: u64,
}

// ---------------------------------------------------------------------------
// WaiterRegistry
// ---------------------------------------------------------------------------

/// A pending waiter: a one-shot delivery slot bound to one connection.
struct Waiter {
    id: WaiterId,
    slot: oneshot::Sender<Arc<Envelope>>,
}

/// Per-channel ordered sequences of pending waiters.
///
/// Process-wide shared state behind one coarse [`Mutex`]. Every mutation
/// of a channel's sequence — enqueue, cancel, dispatch — is serialized;
/// the critical sections are a few pointer moves and a non-blocking
/// one-shot send, and whichever side removes a waiter from its sequence
/// owns the slot outright, so delivery and cancellation cannot race.
///
/// Channel entries are removed as soon as their sequence empties; only the
/// pseudonym registry is allowed to grow without bound.
pub struct WaiterRegistry {
    waiters: Mutex<FxHashMap<String, Vec<Waiter>>>,
    next_id: AtomicU64,
}

impl Default for WaiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WaiterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaiterRegistry")
            .field("channels", &self.waiters.lock().len())
            .finish()
    }
}

impl WaiterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            waiters: Mutex::new(FxHashMap::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Appends a new waiter to `channel`'s sequence.
    ///
    /// Returns the waiter id (for [`cancel`](Self::cancel)) and the
    /// receiver that resolves when a publish claims this waiter. Dropping
    /// the receiver marks the waiter dead: the next dispatch that reaches
    /// it discards it and moves on.
    pub fn enqueue(&self, channel: &str) -> (WaiterId, oneshot::Receiver<Arc<Envelope>>) {
        let id = WaiterId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.waiters
            .lock()
            .entry(channel.to_owned())
            .or_default()
            .push(Waiter { id, slot: tx });
        (id, rx)
    }

    /// Removes a specific waiter if it is still pending.
    ///
    /// Idempotent: cancelling a waiter that was already delivered to,
    /// discarded, or cancelled is a no-op. Returns `true` if this call
    /// removed it.
    pub fn cancel(&self, channel: &str, id: WaiterId) -> bool {
        let mut waiters = self.waiters.lock();
        let removed = match waiters.get_mut(channel) {
            Some(seq) => {
                let before = seq.len();
                seq.retain(|w| w.id != id);
                seq.len() != before
            }
            None => false,
        };
        if waiters.get(channel).is_some_and(Vec::is_empty) {
            waiters.remove(channel);
        }
        removed
    }

    /// Attempts to deliver `envelope` to exactly one live waiter.
    ///
    /// Waiters are claimed newest-first (last in, first out): when a
    /// subscriber re-issues overlapping polls, the newest connection is
    /// the one actually being watched. A claimed waiter whose connection
    /// is already gone is discarded and the same envelope is retried
    /// against the next one, until a send lands or the sequence is
    /// exhausted. Every claimed waiter is gone from the sequence
    /// afterwards, delivered or not.
    pub fn dispatch_one(&self, channel: &str, envelope: &Arc<Envelope>) -> DeliveryOutcome {
        let mut waiters = self.waiters.lock();
        let mut outcome = DeliveryOutcome {
            delivered: false,
            dead_discarded: 0,
        };

        if let Some(seq) = waiters.get_mut(channel) {
            while let Some(waiter) = seq.pop() {
                if waiter.slot.send(Arc::clone(envelope)).is_ok() {
                    outcome.delivered = true;
                    break;
                }
                outcome.dead_discarded += 1;
            }
        }
        if waiters.get(channel).is_some_and(Vec::is_empty) {
            waiters.remove(channel);
        }
        outcome
    }

    /// Number of waiters currently pending for `channel`.
    #[must_use]
    pub fn waiter_count(&self, channel: &str) -> usize {
        self.waiters.lock().get(channel).map_or(0, Vec::len)
    }

    /// Number of channels with at least one pending waiter.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.waiters.lock().len()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
