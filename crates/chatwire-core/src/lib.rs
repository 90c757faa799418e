//! chatwire core: wire-level event types, the message model, and error surface.
//!
//! This crate defines the contracts shared by the gateway and client tooling.
//! It intentionally carries no transport or runtime dependencies so it can be
//! reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `ChatWireError`/`Result` so production
//! processes do not crash on malformed input.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod message;
pub mod protocol;

/// Shared result type.
pub use error::{ChatWireError, Result};
pub use message::{Message, NewMessage};
