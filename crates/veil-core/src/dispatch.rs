//! Dispatch orchestration — the subscribe and publish entry points.
//!
//! [`NotificationDispatcher`] is the sole bridge between the pseudonym
//! registry and the waiter registry: the waiter registry keys by private
//! id and knows nothing about pseudonyms; the pseudonym registry holds the
//! one-way mapping publishers address. On subscribe it records the mapping
//! and enqueues a waiter; on publish it resolves the pseudonym, builds the
//! envelope, and runs the pop-and-deliver loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::envelope::Envelope;
use crate::handle::WaitHandle;
use crate::pseudonym::PseudonymRegistry;
use crate::registry::WaiterRegistry;

// ---------------------------------------------------------------------------
// DispatchMetrics
// ---------------------------------------------------------------------------

/// Atomic counters for publish-side observability.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Total publish calls.
    pub publishes: AtomicU64,
    /// Publishes that reached a live waiter.
    pub delivered: AtomicU64,
    /// Publishes that found nobody listening (unresolved pseudonym, empty
    /// sequence, or a sequence exhausted by dead waiters).
    pub undelivered: AtomicU64,
    /// Waiters discarded because their connection was already gone.
    pub dead_waiters: AtomicU64,
}

impl DispatchMetrics {
    /// Returns total publish calls.
    #[must_use]
    pub fn publishes(&self) -> u64 {
        self.publishes.load(Ordering::Relaxed)
    }

    /// Returns publishes that reached a live waiter.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Returns publishes that found nobody listening.
    #[must_use]
    pub fn undelivered(&self) -> u64 {
        self.undelivered.load(Ordering::Relaxed)
    }

    /// Returns the number of dead waiters discarded during dispatch.
    #[must_use]
    pub fn dead_waiters(&self) -> u64 {
        self.dead_waiters.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// NotificationDispatcher
// ---------------------------------------------------------------------------

/// Coordinates the pseudonym registry and the waiter registry.
///
/// Constructed once and shared process-wide behind an `Arc`; the two
/// registries it owns are the only cross-request mutable state in the
/// broker.
///
/// # Usage
///
/// ```rust,ignore
/// let broker = Arc::new(NotificationDispatcher::new());
///
/// // Subscriber side (one long-poll connection):
/// let mut handle = broker.subscribe("alice-channel");
/// let envelope = handle.recv().await?;
///
/// // Publisher side:
/// let delivered = broker.publish(&pseudonym, "ping", data);
/// ```
#[derive(Debug, Default)]
pub struct NotificationDispatcher {
    /// `pseudonym -> private id`, written on subscribe, read on publish.
    pseudonyms: PseudonymRegistry,
    /// Pending waiters per private id.
    waiters: Arc<WaiterRegistry>,
    /// Publish-side counters.
    metrics: DispatchMetrics,
}

impl NotificationDispatcher {
    /// Creates a dispatcher with fresh, empty registries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a long-poll wait on `private_id`'s channel.
    ///
    /// Derives and records the pseudonym, enqueues a waiter, and returns
    /// the handle the transport awaits. The handle removes its waiter on
    /// explicit cancel or on drop, whichever comes first.
    pub fn subscribe(&self, private_id: &str) -> WaitHandle {
        let pseudonym = self.pseudonyms.register(private_id);
        let (id, receiver) = self.waiters.enqueue(private_id);
        tracing::debug!(%pseudonym, %id, "waiter enqueued");
        WaitHandle::new(
            private_id.to_owned(),
            pseudonym,
            id,
            receiver,
            Arc::clone(&self.waiters),
        )
    }

    /// Publishes an event to whoever is watching `pseudonym`'s channel.
    ///
    /// Best-effort and never a fault: an unresolved pseudonym or an
    /// exhausted waiter sequence is the normal "nobody is listening"
    /// outcome and returns `false`. Returns `true` when a live waiter
    /// received the envelope.
    pub fn publish(&self, pseudonym: &str, event_name: &str, data: Value) -> bool {
        self.metrics.publishes.fetch_add(1, Ordering::Relaxed);

        let Some(channel) = self.pseudonyms.resolve(pseudonym) else {
            tracing::debug!(%pseudonym, event = %event_name, "publish to unknown pseudonym");
            self.metrics.undelivered.fetch_add(1, Ordering::Relaxed);
            return false;
        };

        let envelope = Arc::new(Envelope::new(channel.clone(), event_name, data));
        let outcome = self.waiters.dispatch_one(&channel, &envelope);

        self.metrics
            .dead_waiters
            .fetch_add(outcome.dead_discarded, Ordering::Relaxed);
        if outcome.delivered {
            self.metrics.delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.undelivered.fetch_add(1, Ordering::Relaxed);
        }
        tracing::debug!(
            %pseudonym,
            event = %event_name,
            delivered = outcome.delivered,
            dead = outcome.dead_discarded,
            "publish dispatched"
        );
        outcome.delivered
    }

    /// Publish-side counters.
    #[must_use]
    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    /// Number of waiters currently pending for `private_id`'s channel.
    #[must_use]
    pub fn waiter_count(&self, private_id: &str) -> usize {
        self.waiters.waiter_count(private_id)
    }

    /// Number of pseudonyms ever registered. Grows without bound; there is
    /// no eviction.
    #[must_use]
    pub fn pseudonym_count(&self) -> usize {
        self.pseudonyms.len()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::pseudonym::derive;

    // --- Publish resolution ---

    #[test]
    fn test_publish_unknown_pseudonym() {
        let broker = NotificationDispatcher::new();
        assert!(!broker.publish(&derive("nobody"), "ping", json!({})));
        assert_eq!(broker.metrics().publishes(), 1);
        assert_eq!(broker.metrics().undelivered(), 1);
        assert_eq!(broker.metrics().delivered(), 0);
    }

    #[tokio::test]
    async fn test_publish_registered_but_no_waiters() {
        let broker = NotificationDispatcher::new();

        // Subscribe once and let the handle drop: the pseudonym mapping
        // stays, the waiter does not.
        drop(broker.subscribe("alice-channel"));
        assert_eq!(broker.waiter_count("alice-channel"), 0);
        assert_eq!(broker.pseudonym_count(), 1);

        assert!(!broker.publish(&derive("alice-channel"), "ping", json!({})));
        assert_eq!(broker.metrics().undelivered(), 1);
    }

    // --- Subscribe + deliver ---

    #[tokio::test]
    async fn test_subscribe_then_publish_delivers() {
        let broker = NotificationDispatcher::new();
        let mut handle = broker.subscribe("alice-channel");

        let before = crate::envelope::unix_now();
        assert!(broker.publish(handle.pseudonym(), "ping", json!({"x": ["1"]})));

        let env = handle.recv().await.unwrap();
        assert_eq!(env.channel, "alice-channel");
        assert_eq!(env.event, "ping");
        assert_eq!(env.data, json!({"x": ["1"]}));
        assert!(env.time >= before);

        assert_eq!(broker.metrics().delivered(), 1);
    }

    #[tokio::test]
    async fn test_publish_delivers_to_newest() {
        let broker = NotificationDispatcher::new();
        let mut a = broker.subscribe("chan");
        let mut b = broker.subscribe("chan");
        let mut c = broker.subscribe("chan");

        assert!(broker.publish(&derive("chan"), "first", json!({})));
        assert_eq!(c.recv().await.unwrap().event, "first");

        // The older waiters are untouched and served newest-first next.
        assert!(broker.publish(&derive("chan"), "second", json!({})));
        assert_eq!(b.recv().await.unwrap().event, "second");
        assert_eq!(broker.waiter_count("chan"), 1);

        a.cancel();
    }

    #[tokio::test]
    async fn test_publish_skips_cancelled_waiter() {
        let broker = NotificationDispatcher::new();
        let mut a = broker.subscribe("chan");
        let b = broker.subscribe("chan");

        // The newest waiter goes away before the event arrives.
        drop(b);

        assert!(broker.publish(&derive("chan"), "ping", json!({})));
        assert_eq!(a.recv().await.unwrap().event, "ping");
    }

    #[tokio::test]
    async fn test_at_most_one_delivery_per_publish() {
        let broker = NotificationDispatcher::new();
        let mut a = broker.subscribe("chan");
        let mut b = broker.subscribe("chan");

        assert!(broker.publish(&derive("chan"), "only-once", json!({})));

        assert_eq!(b.recv().await.unwrap().event, "only-once");
        // The older waiter saw nothing; cancel it and verify cleanly.
        a.cancel();
        assert!(a.recv().await.is_err());
    }

    // --- Metrics ---

    #[tokio::test]
    async fn test_metrics_counts() {
        let broker = NotificationDispatcher::new();

        let mut live = broker.subscribe("chan");
        assert!(broker.publish(&derive("chan"), "ping", json!({})));
        live.recv().await.unwrap();

        assert!(!broker.publish(&derive("chan"), "ping", json!({})));
        assert!(!broker.publish(&derive("unknown"), "ping", json!({})));

        let m = broker.metrics();
        assert_eq!(m.publishes(), 3);
        assert_eq!(m.delivered(), 1);
        assert_eq!(m.undelivered(), 2);
        assert_eq!(m.dead_waiters(), 0);
    }
}
