//! Shared helpers for the HTTP integration tests.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{test, web, App, Error};
use serde_json::{json, Value};

use backend::inbound::http::{configure_api, HttpState};
use backend::test_support::{test_http_state, InMemoryRepositories};

/// Build the application under test against one in-memory store.
pub fn build_test_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = Error,
        InitError = (),
    >,
> {
    App::new().app_data(state).configure(configure_api)
}

/// Fresh state + store pair for one test.
pub fn fresh_state() -> (web::Data<HttpState>, Arc<InMemoryRepositories>) {
    let (state, repos) = test_http_state();
    (web::Data::new(state), repos)
}

/// Register a user and return their bearer token and id.
pub async fn register_user<S>(app: &S, email: &str) -> (String, uuid::Uuid)
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "email": email,
                "password": "password123",
                "displayName": "Test Worker",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 201, "registration should succeed");
    let body: Value = test::read_body_json(res).await;
    let token = body["token"].as_str().expect("token present").to_owned();
    let user_id = body["user"]["id"]
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .expect("user id present");
    (token, user_id)
}

/// GET with a bearer token, returning (status, body).
pub async fn get_json<S>(app: &S, token: &str, uri: &str) -> (u16, Value)
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::get()
            .uri(uri)
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request(),
    )
    .await;
    read_response(res).await
}

/// POST a JSON body with a bearer token, returning (status, body).
pub async fn post_json<S>(app: &S, token: &str, uri: &str, body: Value) -> (u16, Value)
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri(uri)
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(body)
            .to_request(),
    )
    .await;
    read_response(res).await
}

/// PATCH a JSON body with a bearer token, returning (status, body).
pub async fn patch_json<S>(app: &S, token: &str, uri: &str, body: Value) -> (u16, Value)
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::patch()
            .uri(uri)
            .insert_header(("Authorization", format!("Bearer {token}")))
            .set_json(body)
            .to_request(),
    )
    .await;
    read_response(res).await
}

/// DELETE with a bearer token, returning the status.
pub async fn delete<S>(app: &S, token: &str, uri: &str) -> u16
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = Error>,
{
    let res = test::call_service(
        app,
        test::TestRequest::delete()
            .uri(uri)
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request(),
    )
    .await;
    res.status().as_u16()
}

async fn read_response(res: ServiceResponse<BoxBody>) -> (u16, Value) {
    let status = res.status().as_u16();
    let bytes = test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is JSON")
    };
    (status, body)
}
