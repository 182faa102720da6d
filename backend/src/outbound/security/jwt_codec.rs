//! HS256 JWT implementation of the `TokenCodec` port.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::domain::ports::{AccessClaims, TokenCodec, TokenCodecError};

/// HS256 token codec keyed by a shared secret.
///
/// The secret must be injected at deploy time (`TOKEN_SECRET`) so every
/// instance behind a load balancer verifies every other instance's
/// tokens.
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtTokenCodec {
    /// Build a codec from the shared secret bytes.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, claims: &AccessClaims) -> Result<String, TokenCodecError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|err| TokenCodecError::issue(err.to_string()))
    }

    fn verify(&self, token: &str) -> Result<AccessClaims, TokenCodecError> {
        // Validation::default() is HS256 and enforces `exp`.
        decode::<AccessClaims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| {
                debug!(error = %err, "token verification failed");
                TokenCodecError::invalid()
            })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::user::UserRole;
    use chrono::{Duration, Utc};
    use rstest::rstest;
    use uuid::Uuid;

    fn claims(exp: i64) -> AccessClaims {
        AccessClaims {
            sub: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            email: "worker@example.com".to_owned(),
            role: UserRole::Worker,
            exp,
        }
    }

    #[rstest]
    fn issue_then_verify_round_trips() {
        let codec = JwtTokenCodec::new(b"test-secret");
        let issued = claims((Utc::now() + Duration::hours(1)).timestamp());

        let token = codec.issue(&issued).expect("issues");
        let verified = codec.verify(&token).expect("verifies");

        assert_eq!(verified, issued);
    }

    #[rstest]
    fn expired_tokens_are_invalid() {
        let codec = JwtTokenCodec::new(b"test-secret");
        let token = codec
            .issue(&claims((Utc::now() - Duration::hours(1)).timestamp()))
            .expect("issues");

        assert_eq!(
            codec.verify(&token).expect_err("expired"),
            TokenCodecError::invalid()
        );
    }

    #[rstest]
    fn tokens_from_another_secret_are_invalid() {
        let issuer = JwtTokenCodec::new(b"secret-a");
        let verifier = JwtTokenCodec::new(b"secret-b");
        let token = issuer
            .issue(&claims((Utc::now() + Duration::hours(1)).timestamp()))
            .expect("issues");

        assert!(verifier.verify(&token).is_err());
    }

    #[rstest]
    fn garbage_is_invalid() {
        let codec = JwtTokenCodec::new(b"test-secret");
        assert!(codec.verify("not.a.token").is_err());
    }
}
