//! Message routing and the storage collaborator interface.

pub mod service;
pub mod store;

pub use service::MessageRouter;
pub use store::{InMemoryMessageStore, MessageStore};
