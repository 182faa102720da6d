//! Port for password hashing.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hasher adapters.
    pub enum PasswordHasherError {
        /// Hashing or verification could not run.
        Hash { message: String } => "password hashing failed: {message}",
    }
}

/// Port for one-way password hashing.
///
/// Async because the production adapter offloads the deliberately slow
/// bcrypt work to a blocking thread.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hash a raw password.
    async fn hash(&self, password: &str) -> Result<String, PasswordHasherError>;

    /// Check a raw password against a stored hash.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHasherError>;
}
