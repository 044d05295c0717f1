//! Persistence port used by the handlers.
//!
//! [`crate::db::ScyllaStore`] backs this in production; [`MemoryStore`] keeps
//! everything in process for tests and local development.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{now_millis, Chirp, Page, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email {0} is already registered")]
    DuplicateEmail(String),
    #[error("record not found")]
    NotFound,
    #[error("user {0} does not exist")]
    UnknownUser(Uuid),
    #[error("store backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ChirpStore: Send + Sync {
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    async fn create_user(&self, email: &str) -> StoreResult<User>;

    /// `body` is stored as given; callers sanitize it first.
    async fn create_chirp(&self, body: &str, user_id: Uuid) -> StoreResult<Chirp>;

    /// Chirps in creation order, oldest first.
    async fn list_chirps(&self, page: Page) -> StoreResult<Vec<Chirp>>;

    async fn get_chirp(&self, id: Uuid) -> StoreResult<Chirp>;

    /// Remove every user and chirp.
    async fn reset(&self) -> StoreResult<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    emails: HashSet<String>,
    chirps: Vec<Chirp>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ChirpStore for MemoryStore {
    async fn create_user(&self, email: &str) -> StoreResult<User> {
        let mut state = self.lock()?;
        if !state.emails.insert(email.to_string()) {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }
        let now = now_millis();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn create_chirp(&self, body: &str, user_id: Uuid) -> StoreResult<Chirp> {
        let mut state = self.lock()?;
        if !state.users.iter().any(|user| user.id == user_id) {
            return Err(StoreError::UnknownUser(user_id));
        }
        let now = now_millis();
        let chirp = Chirp {
            id: Uuid::new_v4(),
            body: body.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        state.chirps.push(chirp.clone());
        Ok(chirp)
    }

    async fn list_chirps(&self, page: Page) -> StoreResult<Vec<Chirp>> {
        let state = self.lock()?;
        Ok(state
            .chirps
            .iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_chirp(&self, id: Uuid) -> StoreResult<Chirp> {
        let state = self.lock()?;
        state
            .chirps
            .iter()
            .find(|chirp| chirp.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn reset(&self) -> StoreResult<()> {
        let mut state = self.lock()?;
        *state = MemoryState::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> MemoryStore {
        MemoryStore::new()
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_rejected(store: MemoryStore) {
        store.create_user("a@example.com").await.expect("first user");
        let err = store
            .create_user("a@example.com")
            .await
            .expect_err("duplicate");
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn chirp_requires_existing_user(store: MemoryStore) {
        let err = store
            .create_chirp("hello", Uuid::new_v4())
            .await
            .expect_err("unknown user");
        assert!(matches!(err, StoreError::UnknownUser(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn lists_in_creation_order_with_paging(store: MemoryStore) {
        let user = store.create_user("b@example.com").await.expect("user");
        for n in 0..5 {
            store
                .create_chirp(&format!("chirp {n}"), user.id)
                .await
                .expect("chirp");
        }

        let all = store.list_chirps(Page::default()).await.expect("list");
        let bodies: Vec<_> = all.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, ["chirp 0", "chirp 1", "chirp 2", "chirp 3", "chirp 4"]);

        let window = store
            .list_chirps(Page { limit: 2, offset: 1 })
            .await
            .expect("window");
        let bodies: Vec<_> = window.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, ["chirp 1", "chirp 2"]);
    }

    #[rstest]
    #[tokio::test]
    async fn get_chirp_reports_missing(store: MemoryStore) {
        let err = store.get_chirp(Uuid::new_v4()).await.expect_err("missing");
        assert!(matches!(err, StoreError::NotFound));
    }

    #[rstest]
    #[tokio::test]
    async fn reset_clears_users_and_chirps(store: MemoryStore) {
        let user = store.create_user("c@example.com").await.expect("user");
        store.create_chirp("hi", user.id).await.expect("chirp");

        store.reset().await.expect("reset");

        assert!(store.list_chirps(Page::default()).await.expect("list").is_empty());
        store
            .create_user("c@example.com")
            .await
            .expect("email is free again");
    }
}
