//! Dashboard aggregation and platform linking over the HTTP surface.

mod support;

use actix_web::test;
use chrono::{Days, Utc};
use serde_json::json;

use support::{build_test_app, delete, fresh_state, get_json, post_json, register_user};

#[actix_web::test]
async fn linking_unlinking_and_relinking_reuse_one_row() {
    let (state, repos) = fresh_state();
    let platform = repos.seed_platform("Amazon Flex", "amazon-flex");
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "worker@example.com").await;

    let (status, linked) = post_json(
        &app,
        &token,
        "/api/dashboard/link",
        json!({ "platformId": platform.id, "displayName": "Flex AM" }),
    )
    .await;
    assert_eq!(status, 201);
    let link_id = linked["id"].as_str().expect("link id").to_owned();
    assert_eq!(linked["displayName"], "Flex AM");
    assert_eq!(linked["platform"]["slug"], "amazon-flex");

    // Linking the same platform again conflicts.
    let (status, body) = post_json(
        &app,
        &token,
        "/api/dashboard/link",
        json!({ "platformId": platform.id }),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["code"], "conflict");

    // Unlink soft-deactivates; the dashboard no longer shows it.
    assert_eq!(delete(&app, &token, &format!("/api/dashboard/link/{link_id}")).await, 204);
    let (_, dashboard) = get_json(&app, &token, "/api/dashboard").await;
    assert_eq!(dashboard["platformLinks"].as_array().expect("links").len(), 0);

    // Relinking reactivates the original row rather than minting a new
    // one, keeping history and foreign keys intact.
    let (status, relinked) = post_json(
        &app,
        &token,
        "/api/dashboard/link",
        json!({ "platformId": platform.id }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(relinked["id"], link_id.as_str());
}

#[actix_web::test]
async fn linking_an_unknown_platform_is_not_found() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "worker@example.com").await;

    let (status, _) = post_json(
        &app,
        &token,
        "/api/dashboard/link",
        json!({ "platformId": uuid::Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, 404);
}

#[actix_web::test]
async fn launch_stamps_last_accessed_and_returns_the_urls() {
    let (state, repos) = fresh_state();
    let platform = repos.seed_platform("DoorDash", "doordash");
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "worker@example.com").await;

    let (_, linked) = post_json(
        &app,
        &token,
        "/api/dashboard/link",
        json!({ "platformId": platform.id }),
    )
    .await;
    let link_id = linked["id"].as_str().expect("link id");
    assert!(linked["lastAccessedAt"].is_null());

    let (status, launched) = post_json(
        &app,
        &token,
        &format!("/api/dashboard/launch/{link_id}"),
        json!({}),
    )
    .await;
    assert_eq!(status, 200);
    assert!(!launched["lastAccessedAt"].is_null());
    assert_eq!(launched["platform"]["deepLinkUrl"], "doordash://");
}

#[actix_web::test]
async fn dashboard_folds_the_last_seven_days_of_earnings() {
    let (state, repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, user_id) = register_user(&app, "worker@example.com").await;
    repos.set_unread_notifications(user_id, 3);

    let today = Utc::now().date_naive();
    let within_window = today.checked_sub_days(Days::new(3)).expect("date");
    let outside_window = today.checked_sub_days(Days::new(8)).expect("date");

    for (amount, tips, day) in [
        ("10.00", "1.00", today),
        ("20.00", "0.50", within_window),
        ("99.99", "9.99", outside_window),
    ] {
        let (status, _) = post_json(
            &app,
            &token,
            "/api/earnings",
            json!({ "amount": amount, "tips": tips, "earnedOn": day }),
        )
        .await;
        assert_eq!(status, 201);
    }

    // Today's shift shows up in the dashboard too.
    let (status, _) = post_json(&app, &token, "/api/shifts", json!({})).await;
    assert_eq!(status, 201);

    let (status, dashboard) = get_json(&app, &token, "/api/dashboard").await;
    assert_eq!(status, 200);
    // 10.00 + 1.00 + 20.00 + 0.50, the 8-day-old record excluded.
    assert_eq!(dashboard["weekEarnings"]["totalCents"], 3150);
    assert_eq!(dashboard["weekEarnings"]["tipsCents"], 150);
    assert_eq!(dashboard["weekEarnings"]["recordCount"], 2);
    assert_eq!(dashboard["unreadNotifications"], 3);
    assert_eq!(dashboard["todaysShifts"].as_array().expect("shifts").len(), 1);
}

#[actix_web::test]
async fn platform_catalog_is_readable_without_a_token() {
    let (state, repos) = fresh_state();
    repos.seed_platform("Amazon Flex", "amazon-flex");
    repos.seed_platform("Roadie", "roadie");
    let app = test::init_service(build_test_app(state)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/platforms").to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body.as_array().expect("platforms").len(), 2);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/platforms/search?q=flex")
            .to_request(),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body.as_array().expect("platforms").len(), 1);
    assert_eq!(body[0]["slug"], "amazon-flex");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/platforms/roadie")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 200);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/platforms/ghost")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), 404);
}
