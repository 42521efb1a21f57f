use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
}

/// In-memory user directory shared by every request
#[derive(Default)]
pub struct UserStore {
    users: RwLock<Vec<User>>,
}

impl UserStore {
    pub fn seeded() -> Self {
        let store = Self::default();
        store.create("John".to_string());
        store.create("Jane".to_string());
        store
    }

    pub fn all(&self) -> Vec<User> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn find(&self, id: u64) -> Option<User> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|user| user.id == id)
            .cloned()
    }

    pub fn create(&self, name: String) -> User {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let id = users.iter().map(|user| user.id).max().unwrap_or(0) + 1;
        let user = User { id, name };
        users.push(user.clone());
        user
    }

    /// Remove a user, returning whether it existed
    pub fn remove(&self, id: u64) -> bool {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let before = users.len();
        users.retain(|user| user.id != id);
        users.len() != before
    }
}
