//! Account endpoints: register, login, current user, logout.

use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    AuthenticatedSession, Credentials, CredentialsValidationError, Error, Registration,
    RegistrationValidationError, User,
};

use super::auth::AuthenticatedUser;
use super::state::HttpState;
use super::ApiResult;

/// Request body for `POST /api/auth/register`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Email address, normalised to lower case.
    pub email: String,
    /// Raw password, at least eight characters.
    pub password: String,
    /// Display name.
    pub display_name: String,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = RegistrationValidationError;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password, &value.display_name)
    }
}

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Raw password.
    pub password: String,
}

impl TryFrom<LoginRequest> for Credentials {
    type Error = CredentialsValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn map_registration_validation_error(err: RegistrationValidationError) -> Error {
    let (field, code) = match &err {
        RegistrationValidationError::Email(_) => ("email", "invalid_email"),
        RegistrationValidationError::PasswordTooShort => ("password", "password_too_short"),
        RegistrationValidationError::DisplayNameEmpty => ("displayName", "empty_display_name"),
        RegistrationValidationError::DisplayNameTooLong => {
            ("displayName", "display_name_too_long")
        }
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

fn map_credentials_validation_error(err: CredentialsValidationError) -> Error {
    let (field, code) = match &err {
        CredentialsValidationError::Email(_) => ("email", "invalid_email"),
        CredentialsValidationError::EmptyPassword => ("password", "empty_password"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Create an account and issue its first token.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthenticatedSession),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())
        .map_err(map_registration_validation_error)?;
    let session = state.auth.register(registration, Utc::now()).await?;
    Ok(HttpResponse::Created().json(session))
}

/// Verify credentials and issue a fresh token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AuthenticatedSession),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthenticatedSession>> {
    let credentials =
        Credentials::try_from(payload.into_inner()).map_err(map_credentials_validation_error)?;
    let session = state.auth.login(credentials, Utc::now()).await?;
    Ok(web::Json(session))
}

/// Profile of the authenticated caller.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Account no longer exists", body = Error)
    ),
    tags = ["auth"],
    operation_id = "currentUser",
    security(("bearer_token" = []))
)]
#[get("/auth/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<User>> {
    let profile = state.auth.current_user(user.user_id()).await?;
    Ok(web::Json(profile))
}

/// Drop the session row backing the presented token.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["auth"],
    operation_id = "logout",
    security(("bearer_token" = []))
)]
#[post("/auth/logout")]
pub async fn logout(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    state.auth.logout(user.user_id(), &user.token).await?;
    Ok(HttpResponse::NoContent().finish())
}
