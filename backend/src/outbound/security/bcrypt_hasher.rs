//! bcrypt-backed `PasswordHasher` adapter.

use async_trait::async_trait;
use tokio::task;

use crate::domain::ports::{PasswordHasher, PasswordHasherError};

/// Work factor for new hashes. Verification reads the factor from the
/// stored hash, so raising this only affects new registrations.
const BCRYPT_COST: u32 = 12;

/// bcrypt implementation of the `PasswordHasher` port.
///
/// bcrypt is deliberately slow, so both operations run on the blocking
/// thread pool rather than stalling a runtime worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptPasswordHasher;

impl BcryptPasswordHasher {
    /// Create the adapter.
    pub fn new() -> Self {
        Self
    }
}

fn map_join_error(error: task::JoinError) -> PasswordHasherError {
    PasswordHasherError::hash(format!("hashing task failed: {error}"))
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHasherError> {
        let password = password.to_owned();
        task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
            .await
            .map_err(map_join_error)?
            .map_err(|err| PasswordHasherError::hash(err.to_string()))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHasherError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(map_join_error)?
            .map_err(|err| PasswordHasherError::hash(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module. A reduced-cost fixture hash
    //! would be faster, but one real round trip keeps the adapter honest.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn hash_and_verify_round_trip() {
        let hasher = BcryptPasswordHasher::new();
        let hash = hasher.hash("correct horse").await.expect("hashes");
        assert!(hash.starts_with("$2"));
        assert!(hasher.verify("correct horse", &hash).await.expect("verifies"));
        assert!(!hasher.verify("wrong horse", &hash).await.expect("verifies"));
    }

    #[rstest]
    #[tokio::test]
    async fn verify_rejects_garbage_hashes() {
        let hasher = BcryptPasswordHasher::new();
        assert!(hasher.verify("anything", "not-a-hash").await.is_err());
    }
}
