//! Bearer-token extraction for HTTP handlers.
//!
//! [`AuthenticatedUser`] rejects the request with 401 when the
//! `Authorization` header is missing or fails verification;
//! [`MaybeAuthenticated`] swallows those failures for endpoints that
//! merely personalise their response when a token happens to be valid.
//!
//! Verification is signature + expiry only. Session rows exist so logout
//! can drop a token's row; they are deliberately not consulted here.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::domain::ports::AccessClaims;
use crate::domain::Error;

use super::state::HttpState;

/// The verified caller, extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Decoded token claims.
    pub claims: AccessClaims,
    /// The raw token as presented, needed by logout.
    pub token: String,
}

impl AuthenticatedUser {
    /// The caller's user id.
    pub fn user_id(&self) -> Uuid {
        self.claims.sub
    }
}

/// Like [`AuthenticatedUser`] but never rejects the request.
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<AuthenticatedUser>);

fn extract_user(req: &HttpRequest) -> Result<AuthenticatedUser, Error> {
    let state = req
        .app_data::<web::Data<HttpState>>()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))?;

    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let raw = header
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let token = raw
        .strip_prefix("Bearer ")
        .ok_or_else(|| Error::unauthorized("authorization scheme must be Bearer"))?
        .trim();
    if token.is_empty() {
        return Err(Error::unauthorized("missing bearer token"));
    }

    let claims = state.tokens.verify(token).map_err(|_| {
        Error::unauthorized("token is invalid or expired")
    })?;

    Ok(AuthenticatedUser {
        claims,
        token: token.to_owned(),
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_user(req))
    }
}

impl FromRequest for MaybeAuthenticated {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self(extract_user(req).ok())))
    }
}
