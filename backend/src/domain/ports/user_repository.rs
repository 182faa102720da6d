//! Port for account persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::user::{Email, User, UserRole};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
        /// The email address is already registered.
        DuplicateEmail => "email is already registered",
    }
}

/// Insert payload for a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// Primary key chosen by the caller.
    pub id: Uuid,
    /// Normalised address; uniqueness enforced by the adapter.
    pub email: Email,
    /// bcrypt hash, never the raw password.
    pub password_hash: String,
    /// Display name.
    pub display_name: String,
    /// Initial role.
    pub role: UserRole,
}

/// A user together with the stored credential hash, for login checks.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredUser {
    /// The account.
    pub user: User,
    /// bcrypt hash to verify against.
    pub password_hash: String,
}

/// Port for reading and writing accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    ///
    /// Fails with [`UserRepositoryError::DuplicateEmail`] when the email
    /// is taken.
    async fn insert(&self, new_user: NewUser) -> Result<User, UserRepositoryError>;

    /// Find an account and its credential hash by email.
    async fn find_by_email(&self, email: &Email)
    -> Result<Option<StoredUser>, UserRepositoryError>;

    /// Find an account by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError>;
}
