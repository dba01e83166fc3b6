//! The user store boundary.
//!
//! The realtime and auth layers need only a handful of user operations:
//! create, look up, append a notification, count and clear unread ones,
//! and record a follow. [`UserStore`] names exactly those, so the
//! in-memory implementation here and a document-database one are
//! interchangeable.

use std::collections::HashMap;
use std::future::Future;

use quill_protocol::UserId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::StoreError;

/// One entry in a user's notification list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Who did the thing.
    pub actor: UserId,
    pub read: bool,
}

/// A stored account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Normalized (trimmed, lowercased).
    pub email: String,
    pub name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub notifications: Vec<Notification>,
    pub followers: Vec<UserId>,
    pub following: Vec<UserId>,
}

impl User {
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}

/// Fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Persistence for users, as seen by the auth and notification layers.
pub trait UserStore: Send + Sync + 'static {
    /// Creates a user with a fresh id.
    ///
    /// # Errors
    /// [`StoreError::DuplicateEmail`] if the email is taken.
    fn insert(
        &self,
        user: NewUser,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Option<User>> + Send;

    fn find_by_id(
        &self,
        id: &UserId,
    ) -> impl Future<Output = Option<User>> + Send;

    /// Appends an unread notification from `actor` to `target`'s list.
    fn push_notification(
        &self,
        target: &UserId,
        actor: UserId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Unread notifications for `id`; 0 for unknown users.
    fn unread_count(&self, id: &UserId) -> impl Future<Output = usize> + Send;

    /// Flips every notification of `id` to read. Returns how many changed;
    /// unknown users are a no-op.
    fn mark_all_read(&self, id: &UserId) -> impl Future<Output = usize> + Send;

    /// Records that `follower` follows `target`. Returns `false` if that
    /// was already the case.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if either user doesn't exist.
    fn follow(
        &self,
        follower: &UserId,
        target: &UserId,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    /// Normalized email → id. Kept in sync with `users`.
    emails: HashMap<String, UserId>,
}

/// A [`UserStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.emails.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let id = UserId::new(uuid::Uuid::new_v4().to_string());
        let record = User {
            id: id.clone(),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            notifications: Vec::new(),
            followers: Vec::new(),
            following: Vec::new(),
        };
        tables.emails.insert(record.email.clone(), id.clone());
        tables.users.insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Option<User> {
        let tables = self.tables.read().await;
        let id = tables.emails.get(email)?;
        tables.users.get(id).cloned()
    }

    async fn find_by_id(&self, id: &UserId) -> Option<User> {
        self.tables.read().await.users.get(id).cloned()
    }

    async fn push_notification(
        &self,
        target: &UserId,
        actor: UserId,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(target)
            .ok_or_else(|| StoreError::NotFound(target.clone()))?;
        user.notifications.push(Notification { actor, read: false });
        Ok(())
    }

    async fn unread_count(&self, id: &UserId) -> usize {
        self.tables
            .read()
            .await
            .users
            .get(id)
            .map_or(0, User::unread_count)
    }

    async fn mark_all_read(&self, id: &UserId) -> usize {
        let mut tables = self.tables.write().await;
        let Some(user) = tables.users.get_mut(id) else {
            return 0;
        };
        let mut changed = 0;
        for n in user.notifications.iter_mut().filter(|n| !n.read) {
            n.read = true;
            changed += 1;
        }
        changed
    }

    async fn follow(
        &self,
        follower: &UserId,
        target: &UserId,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(target) {
            return Err(StoreError::NotFound(target.clone()));
        }
        let source = tables
            .users
            .get_mut(follower)
            .ok_or_else(|| StoreError::NotFound(follower.clone()))?;
        if source.following.contains(target) {
            return Ok(false);
        }
        source.following.push(target.clone());
        if let Some(dest) = tables.users.get_mut(target) {
            dest.followers.push(follower.clone());
        }
        Ok(true)
    }
}
