//! Account lifecycle: registration, login, profile lookup, logout.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::Error;
use super::ports::{
    AccessClaims, NewSession, NewUser, PasswordHasher, PasswordHasherError, SessionRepository,
    SessionRepositoryError, TokenCodec, TokenCodecError, UserRepository, UserRepositoryError,
};
use super::user::{Email, EmailValidationError, User, UserRole};

/// Access token lifetime. There is no refresh rotation; clients log in
/// again when the token lapses.
pub const TOKEN_TTL_DAYS: i64 = 7;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_DISPLAY_NAME_LEN: usize = 64;

/// Validated registration payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// Normalised address.
    pub email: Email,
    /// Raw password, hashed before it ever reaches a repository.
    pub password: String,
    /// Display name.
    pub display_name: String,
}

/// Validation errors for [`Registration`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationValidationError {
    /// The email failed shape checks.
    #[error(transparent)]
    Email(#[from] EmailValidationError),
    /// The password is shorter than the minimum.
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    /// The display name is empty.
    #[error("display name must not be empty")]
    DisplayNameEmpty,
    /// The display name exceeds the maximum length.
    #[error("display name must be at most {MAX_DISPLAY_NAME_LEN} characters")]
    DisplayNameTooLong,
}

impl Registration {
    /// Validate raw request parts.
    pub fn try_from_parts(
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<Self, RegistrationValidationError> {
        let email = Email::new(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegistrationValidationError::PasswordTooShort);
        }
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(RegistrationValidationError::DisplayNameEmpty);
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
            return Err(RegistrationValidationError::DisplayNameTooLong);
        }
        Ok(Self {
            email,
            password: password.to_owned(),
            display_name: display_name.to_owned(),
        })
    }
}

/// Validated login payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    /// Normalised address.
    pub email: Email,
    /// Raw password.
    pub password: String,
}

/// Validation errors for [`Credentials`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    /// The email failed shape checks.
    #[error(transparent)]
    Email(#[from] EmailValidationError),
    /// The password is empty.
    #[error("password must not be empty")]
    EmptyPassword,
}

impl Credentials {
    /// Validate raw request parts.
    pub fn try_from_parts(
        email: &str,
        password: &str,
    ) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: password.to_owned(),
        })
    }
}

/// A signed token plus the account it authenticates.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedSession {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// Hard expiry of the token.
    pub expires_at: DateTime<Utc>,
    /// The authenticated account.
    pub user: User,
}

/// Neutral credential-failure message. Shared between the unknown-email
/// and wrong-password paths so responses do not reveal which check
/// failed.
const BAD_CREDENTIALS: &str = "invalid email or password";

fn map_user_repo_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateEmail => Error::conflict("email is already registered"),
    }
}

fn map_session_repo_error(error: SessionRepositoryError) -> Error {
    match error {
        SessionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("session repository unavailable: {message}"))
        }
        SessionRepositoryError::Query { message } => {
            Error::internal(format!("session repository error: {message}"))
        }
    }
}

fn map_hasher_error(error: PasswordHasherError) -> Error {
    match error {
        PasswordHasherError::Hash { message } => {
            Error::internal(format!("password hashing error: {message}"))
        }
    }
}

fn map_codec_error(error: TokenCodecError) -> Error {
    match error {
        TokenCodecError::Issue { message } => {
            Error::internal(format!("token issuance error: {message}"))
        }
        TokenCodecError::Invalid => Error::unauthorized("token is invalid or expired"),
    }
}

/// Account lifecycle service.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenCodec>,
}

impl AuthService {
    /// Create the service from its ports.
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            tokens,
        }
    }

    /// Register a new worker account and issue its first token.
    pub async fn register(
        &self,
        registration: Registration,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedSession, Error> {
        let password_hash = self
            .hasher
            .hash(&registration.password)
            .await
            .map_err(map_hasher_error)?;

        let user = self
            .users
            .insert(NewUser {
                id: Uuid::new_v4(),
                email: registration.email,
                password_hash,
                display_name: registration.display_name,
                role: UserRole::Worker,
            })
            .await
            .map_err(map_user_repo_error)?;

        self.open_session(user, now).await
    }

    /// Verify credentials, prune the caller's expired sessions, and
    /// issue a fresh token.
    pub async fn login(
        &self,
        credentials: Credentials,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedSession, Error> {
        let stored = self
            .users
            .find_by_email(&credentials.email)
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| Error::unauthorized(BAD_CREDENTIALS))?;

        let verified = self
            .hasher
            .verify(&credentials.password, &stored.password_hash)
            .await
            .map_err(map_hasher_error)?;
        if !verified {
            return Err(Error::unauthorized(BAD_CREDENTIALS));
        }

        let pruned = self
            .sessions
            .delete_expired_for_user(stored.user.id, now)
            .await
            .map_err(map_session_repo_error)?;
        if pruned > 0 {
            debug!(user_id = %stored.user.id, pruned, "pruned expired sessions");
        }

        self.open_session(stored.user, now).await
    }

    /// Profile for the authenticated user.
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_repo_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    /// Delete the session row holding the presented token.
    ///
    /// Logging out twice is fine; the second call is a no-op.
    pub async fn logout(&self, user_id: Uuid, token: &str) -> Result<(), Error> {
        let deleted = self
            .sessions
            .delete_by_token(user_id, token)
            .await
            .map_err(map_session_repo_error)?;
        if !deleted {
            debug!(user_id = %user_id, "logout for a token with no session row");
        }
        Ok(())
    }

    async fn open_session(
        &self,
        user: User,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedSession, Error> {
        let expires_at = now + Duration::days(TOKEN_TTL_DAYS);
        let claims = AccessClaims {
            sub: user.id,
            jti: Uuid::new_v4(),
            email: user.email.as_str().to_owned(),
            role: user.role,
            exp: expires_at.timestamp(),
        };
        let token = self.tokens.issue(&claims).map_err(map_codec_error)?;

        self.sessions
            .insert(NewSession {
                id: Uuid::new_v4(),
                user_id: user.id,
                token: token.clone(),
                expires_at,
            })
            .await
            .map_err(map_session_repo_error)?;

        Ok(AuthenticatedSession {
            token,
            expires_at,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        MockPasswordHasher, MockSessionRepository, MockTokenCodec, MockUserRepository, Session,
        StoredUser,
    };
    use rstest::rstest;

    fn sample_user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: Email::new(email).expect("valid email"),
            display_name: "Sam Doe".to_owned(),
            role: UserRole::Worker,
            is_premium: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(
        users: MockUserRepository,
        sessions: MockSessionRepository,
        hasher: MockPasswordHasher,
        tokens: MockTokenCodec,
    ) -> AuthService {
        AuthService::new(
            Arc::new(users),
            Arc::new(sessions),
            Arc::new(hasher),
            Arc::new(tokens),
        )
    }

    fn accepting_session_repo() -> MockSessionRepository {
        let mut sessions = MockSessionRepository::new();
        sessions.expect_insert().returning(|new| {
            Ok(Session {
                id: new.id,
                user_id: new.user_id,
                token: new.token,
                expires_at: new.expires_at,
                created_at: Utc::now(),
            })
        });
        sessions
            .expect_delete_expired_for_user()
            .returning(|_, _| Ok(0));
        sessions
    }

    #[rstest]
    #[case("worker@example.com", "short", "Sam", RegistrationValidationError::PasswordTooShort)]
    #[case("worker@example.com", "long enough", "  ", RegistrationValidationError::DisplayNameEmpty)]
    #[case(
        "bad-email",
        "long enough",
        "Sam",
        RegistrationValidationError::Email(EmailValidationError::Malformed)
    )]
    fn registration_validates_parts(
        #[case] email: &str,
        #[case] password: &str,
        #[case] name: &str,
        #[case] expected: RegistrationValidationError,
    ) {
        let err = Registration::try_from_parts(email, password, name).expect_err("invalid");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn register_issues_token_and_session() {
        let mut users = MockUserRepository::new();
        users.expect_insert().returning(|new| {
            Ok(User {
                id: new.id,
                email: new.email,
                display_name: new.display_name,
                role: new.role,
                is_premium: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        });

        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|_| Ok("$2b$12$hash".to_owned()));

        let mut tokens = MockTokenCodec::new();
        tokens.expect_issue().returning(|_| Ok("signed".to_owned()));

        let svc = service(users, accepting_session_repo(), hasher, tokens);
        let registration =
            Registration::try_from_parts("Worker@Example.com", "password123", "Sam")
                .expect("valid registration");

        let session = svc
            .register(registration, Utc::now())
            .await
            .expect("registration succeeds");

        assert_eq!(session.token, "signed");
        assert_eq!(session.user.email.as_str(), "worker@example.com");
        assert_eq!(session.user.role, UserRole::Worker);
    }

    #[rstest]
    #[tokio::test]
    async fn register_duplicate_email_is_conflict() {
        let mut users = MockUserRepository::new();
        users
            .expect_insert()
            .returning(|_| Err(UserRepositoryError::duplicate_email()));

        let mut hasher = MockPasswordHasher::new();
        hasher.expect_hash().returning(|_| Ok("h".to_owned()));

        let svc = service(
            users,
            MockSessionRepository::new(),
            hasher,
            MockTokenCodec::new(),
        );
        let registration =
            Registration::try_from_parts("dup@example.com", "password123", "Sam")
                .expect("valid registration");

        let err = svc
            .register(registration, Utc::now())
            .await
            .expect_err("duplicate");
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    #[tokio::test]
    async fn login_failures_share_one_message(#[case] known_email: bool) {
        // Unknown email and wrong password must be indistinguishable.
        let mut users = MockUserRepository::new();
        if known_email {
            users.expect_find_by_email().returning(|email| {
                Ok(Some(StoredUser {
                    user: sample_user(email.as_str()),
                    password_hash: "$2b$12$hash".to_owned(),
                }))
            });
        } else {
            users.expect_find_by_email().returning(|_| Ok(None));
        }

        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().returning(|_, _| Ok(false));

        let svc = service(
            users,
            MockSessionRepository::new(),
            hasher,
            MockTokenCodec::new(),
        );
        let credentials =
            Credentials::try_from_parts("worker@example.com", "wrong-password")
                .expect("valid credentials");

        let err = svc
            .login(credentials, Utc::now())
            .await
            .expect_err("login fails");
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.message, BAD_CREDENTIALS);
    }

    #[rstest]
    #[tokio::test]
    async fn login_prunes_expired_sessions() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|email| {
            Ok(Some(StoredUser {
                user: sample_user(email.as_str()),
                password_hash: "$2b$12$hash".to_owned(),
            }))
        });

        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().returning(|_, _| Ok(true));

        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_delete_expired_for_user()
            .times(1)
            .returning(|_, _| Ok(3));
        sessions.expect_insert().returning(|new| {
            Ok(Session {
                id: new.id,
                user_id: new.user_id,
                token: new.token,
                expires_at: new.expires_at,
                created_at: Utc::now(),
            })
        });

        let mut tokens = MockTokenCodec::new();
        tokens.expect_issue().returning(|_| Ok("signed".to_owned()));

        let svc = service(users, sessions, hasher, tokens);
        let credentials = Credentials::try_from_parts("worker@example.com", "password123")
            .expect("valid credentials");

        let session = svc
            .login(credentials, Utc::now())
            .await
            .expect("login succeeds");
        assert_eq!(session.token, "signed");
    }

    #[rstest]
    #[tokio::test]
    async fn logout_deletes_only_the_presented_token() {
        let user_id = Uuid::new_v4();
        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_delete_by_token()
            .withf(move |uid, token| *uid == user_id && token == "the-token")
            .times(1)
            .returning(|_, _| Ok(true));

        let svc = service(
            MockUserRepository::new(),
            sessions,
            MockPasswordHasher::new(),
            MockTokenCodec::new(),
        );
        svc.logout(user_id, "the-token").await.expect("logout ok");
    }

    #[rstest]
    #[tokio::test]
    async fn token_expiry_tracks_ttl() {
        let mut users = MockUserRepository::new();
        users.expect_insert().returning(|new| {
            Ok(User {
                id: new.id,
                email: new.email,
                display_name: new.display_name,
                role: new.role,
                is_premium: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
        });
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_hash().returning(|_| Ok("h".to_owned()));
        let mut tokens = MockTokenCodec::new();
        tokens.expect_issue().returning(|claims| {
            assert!(claims.exp > Utc::now().timestamp());
            Ok("signed".to_owned())
        });

        let svc = service(users, accepting_session_repo(), hasher, tokens);
        let now = Utc::now();
        let registration =
            Registration::try_from_parts("ttl@example.com", "password123", "Sam")
                .expect("valid registration");
        let session = svc.register(registration, now).await.expect("registers");
        assert_eq!(session.expires_at, now + Duration::days(TOKEN_TTL_DAYS));
    }
}
