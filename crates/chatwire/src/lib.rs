//! Top-level facade crate for chatwire.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use chatwire_core::*;
}

pub mod gateway {
    pub use chatwire_gateway::*;
}
