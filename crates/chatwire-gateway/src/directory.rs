//! Contact directory collaborator.
//!
//! Contact/follow lists live in an external profile service; presence only
//! needs "who are this user's contacts" to scope `get-online-users` answers.

use dashmap::DashMap;

/// Resolve a user's contact list (candidate set for presence queries).
pub trait ContactDirectory: Send + Sync {
    fn contacts_of(&self, user_id: &str) -> Vec<String>;
}

/// In-memory directory for tests and development runs.
#[derive(Default)]
pub struct InMemoryContactDirectory {
    contacts: DashMap<String, Vec<String>>,
}

impl InMemoryContactDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_contacts(&self, user_id: impl Into<String>, contacts: Vec<String>) {
        self.contacts.insert(user_id.into(), contacts);
    }
}

impl ContactDirectory for InMemoryContactDirectory {
    fn contacts_of(&self, user_id: &str) -> Vec<String> {
        self.contacts
            .get(user_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }
}
