//! # Veil Server
//!
//! HTTP transport for the Veil notification relay. Three route families:
//!
//! - `GET /watch/{private_id}` — long poll: held open until an event for
//!   the channel arrives, then answered with the JSON envelope
//! - `GET /track/{public_id}/{event}` — publish: query parameters become
//!   the event data; always answers `{"ok":true}`
//! - `GET /static/{*path}` — conventional path-constrained asset serving
//!
//! The broker itself lives in `veil-core`; this crate only adapts it to
//! HTTP and owns connection lifetime (a watch request that goes away drops
//! its wait handle, which cancels the waiter).

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assets;
pub mod config;
pub mod error;
pub mod routes;

pub use assets::AssetDir;
pub use config::ServerConfig;
pub use error::ServerError;
pub use routes::{router, AppState};
