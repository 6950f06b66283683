//! # Veil Core
//!
//! The notification broker for the Veil relay: pseudonym-keyed, best-effort,
//! in-memory event dispatch to pending long-poll connections.
//!
//! This crate provides:
//! - **Pseudonym mapping**: one-way derivation from a private channel id to
//!   the public pseudonym publishers address ([`pseudonym`])
//! - **Waiter registry**: per-channel ordered sets of pending one-shot
//!   delivery slots ([`registry`])
//! - **Dispatch**: subscribe/publish orchestration bridging the two
//!   ([`dispatch`])
//! - **Envelope**: the immutable per-publish payload ([`envelope`])
//!
//! ## Design Principles
//!
//! 1. **Best-effort delivery** — an event with no live waiter is dropped,
//!    never queued; publishers cannot observe whether anyone listened
//! 2. **At-most-once per waiter** — a delivery slot is claimed exactly once,
//!    by delivery, cancellation, or dead-connection discard
//! 3. **One-way indirection** — publishers hold only the pseudonym; the
//!    private channel id never crosses to the publish side (and never
//!    appears in log output)
//!
//! ## Example
//!
//! ```rust,ignore
//! use veil_core::NotificationDispatcher;
//!
//! let broker = NotificationDispatcher::new();
//!
//! let mut handle = broker.subscribe("alice-channel");
//! let pseudonym = handle.pseudonym().to_owned();
//!
//! // Elsewhere, a publisher fires an event at the pseudonym:
//! broker.publish(&pseudonym, "ping", serde_json::json!({"x": ["1"]}));
//!
//! let envelope = handle.recv().await?;
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dispatch;
pub mod envelope;
pub mod handle;
pub mod pseudonym;
pub mod registry;

pub use dispatch::{DispatchMetrics, NotificationDispatcher};
pub use envelope::Envelope;
pub use handle::{WaitError, WaitHandle};
pub use pseudonym::PseudonymRegistry;
pub use registry::{DeliveryOutcome, WaiterId, WaiterRegistry};
