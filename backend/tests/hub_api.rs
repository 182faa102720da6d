//! Hub membership over the HTTP surface.

mod support;

use actix_web::test;
use serde_json::json;

use support::{build_test_app, fresh_state, get_json, post_json, register_user};

#[actix_web::test]
async fn creating_a_hub_promotes_the_creator_to_owner_and_admin() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, user_id) = register_user(&app, "founder@example.com").await;

    let (status, created) = post_json(
        &app,
        &token,
        "/api/hubs",
        json!({ "name": "North Depot", "city": "Leeds" }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(created["membership"]["role"], "OWNER");
    assert_eq!(created["membership"]["userId"], user_id.to_string());

    // Role promotion rides in the same transaction.
    let (_, me) = get_json(&app, &token, "/api/auth/me").await;
    assert_eq!(me["role"], "HUB_ADMIN");

    // One hub per user.
    let (status, _) = post_json(&app, &token, "/api/hubs", json!({ "name": "Second" })).await;
    assert_eq!(status, 409);
}

#[actix_web::test]
async fn joining_is_once_per_user_and_unknown_hubs_are_404() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (owner_token, _owner) = register_user(&app, "owner@example.com").await;
    let (driver_token, _driver) = register_user(&app, "driver@example.com").await;

    let (_, created) = post_json(
        &app,
        &owner_token,
        "/api/hubs",
        json!({ "name": "North Depot" }),
    )
    .await;
    let hub_id = created["hub"]["id"].as_str().expect("hub id");

    let (status, _) = post_json(
        &app,
        &driver_token,
        &format!("/api/hubs/{}/join", uuid::Uuid::new_v4()),
        json!({}),
    )
    .await;
    assert_eq!(status, 404);

    let (status, membership) =
        post_json(&app, &driver_token, &format!("/api/hubs/{hub_id}/join"), json!({})).await;
    assert_eq!(status, 201);
    assert_eq!(membership["role"], "DRIVER");

    let (status, _) =
        post_json(&app, &driver_token, &format!("/api/hubs/{hub_id}/join"), json!({})).await;
    assert_eq!(status, 409);
}

#[actix_web::test]
async fn the_roster_is_gated_to_staff_roles() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (owner_token, _owner) = register_user(&app, "owner@example.com").await;
    let (driver_token, _driver) = register_user(&app, "driver@example.com").await;

    let (_, created) = post_json(
        &app,
        &owner_token,
        "/api/hubs",
        json!({ "name": "North Depot" }),
    )
    .await;
    let hub_id = created["hub"]["id"].as_str().expect("hub id");
    post_json(&app, &driver_token, &format!("/api/hubs/{hub_id}/join"), json!({})).await;

    // Drivers may not read the roster.
    let (status, _) =
        get_json(&app, &driver_token, &format!("/api/hubs/{hub_id}/members")).await;
    assert_eq!(status, 403);

    // The owner sees both members with their profiles.
    let (status, members) =
        get_json(&app, &owner_token, &format!("/api/hubs/{hub_id}/members")).await;
    assert_eq!(status, 200);
    let members = members.as_array().expect("members");
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["role"], "OWNER", "creator joined first");
    assert_eq!(members[1]["email"], "driver@example.com");
}

#[actix_web::test]
async fn search_and_my_hub_round_out_the_flow() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "owner@example.com").await;
    post_json(
        &app,
        &token,
        "/api/hubs",
        json!({ "name": "North Depot", "city": "Leeds" }),
    )
    .await;

    let (_, all) = get_json(&app, &token, "/api/hubs").await;
    assert_eq!(all.as_array().expect("hubs").len(), 1);

    let (_, by_city) = get_json(&app, &token, "/api/hubs/search?q=leeds").await;
    assert_eq!(by_city.as_array().expect("hubs").len(), 1);

    let (_, none) = get_json(&app, &token, "/api/hubs/search?q=nowhere").await;
    assert_eq!(none.as_array().expect("hubs").len(), 0);

    let (status, mine) = get_json(&app, &token, "/api/hubs/my").await;
    assert_eq!(status, 200);
    assert_eq!(mine["hub"]["name"], "North Depot");
    assert_eq!(mine["membership"]["role"], "OWNER");

    let (other_token, _other) = register_user(&app, "loner@example.com").await;
    let (status, _) = get_json(&app, &other_token, "/api/hubs/my").await;
    assert_eq!(status, 404);
}
