//! Port for bearer token issuance and verification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserRole;

use super::define_port_error;

define_port_error! {
    /// Errors raised by token codec adapters.
    pub enum TokenCodecError {
        /// The token could not be signed.
        Issue { message: String } => "token issuance failed: {message}",
        /// Signature or expiry verification failed.
        Invalid => "token is invalid or expired",
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Token id, unique per issuance so two logins in the same second
    /// still produce distinct tokens (logout matches on the exact
    /// token).
    pub jti: Uuid,
    /// Email at issuance time.
    pub email: String,
    /// Role at issuance time.
    pub role: UserRole,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Port for signing and verifying access tokens.
///
/// Verification checks signature and expiry only; session-row existence
/// is deliberately not consulted (logout removes the row so the token
/// stops being renewable, but an unexpired token remains valid until
/// `exp`).
#[cfg_attr(test, mockall::automock)]
pub trait TokenCodec: Send + Sync {
    /// Sign claims into a compact token.
    fn issue(&self, claims: &AccessClaims) -> Result<String, TokenCodecError>;

    /// Verify a presented token and return its claims.
    fn verify(&self, token: &str) -> Result<AccessClaims, TokenCodecError>;
}
