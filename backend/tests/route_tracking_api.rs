//! Route, stop, and package tracking over the HTTP surface, with the
//! counter invariants the product depends on.

mod support;

use actix_web::test;
use serde_json::{json, Value};

use support::{build_test_app, fresh_state, get_json, patch_json, post_json, register_user};

async fn create_route<S>(app: &S, token: &str, name: &str) -> String
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<actix_web::body::BoxBody>,
        Error = actix_web::Error,
    >,
{
    let (status, body) = post_json(app, token, "/api/routes", json!({ "name": name })).await;
    assert_eq!(status, 201, "route creation should succeed: {body}");
    body["id"].as_str().expect("route id").to_owned()
}

#[actix_web::test]
async fn morning_run_scenario_keeps_every_counter_honest() {
    let (state, repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "driver@example.com").await;

    let route_id = create_route(&app, &token, "Morning Run").await;

    // Three stops in one transaction.
    let (status, stops) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/stops/bulk"),
        json!({ "stops": [
            { "address": "1 High Street" },
            { "address": "2 High Street" },
            { "address": "3 High Street" },
        ]}),
    )
    .await;
    assert_eq!(status, 201);
    let sequences: Vec<i64> = stops
        .as_array()
        .expect("stops array")
        .iter()
        .map(|s| s["sequence"].as_i64().expect("sequence"))
        .collect();
    assert_eq!(sequences, vec![1, 2, 3]);

    // Two packages, both scanned in on creation.
    let (status, first_package) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/packages"),
        json!({ "trackingNumber": "TBA000000000001", "barcode": "BC-1" }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(first_package["status"], "SCANNED_IN");

    let (status, _) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/packages"),
        json!({ "trackingNumber": "TBA000000000002", "barcode": "BC-2" }),
    )
    .await;
    assert_eq!(status, 201);

    // Scan the first barcode twice: SCANNED_IN -> OUT_FOR_DELIVERY -> DELIVERED.
    let (status, scanned) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/packages/scan"),
        json!({ "barcode": "BC-1" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(scanned["package"]["status"], "OUT_FOR_DELIVERY");
    assert_eq!(scanned["route"]["deliveredPackages"], 0);

    let (status, scanned) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/packages/scan"),
        json!({ "barcode": "BC-1" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(scanned["package"]["status"], "DELIVERED");
    assert_eq!(scanned["route"]["deliveredPackages"], 1);

    // The detail view reflects every counter.
    let (status, detail) = get_json(&app, &token, &format!("/api/routes/{route_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(detail["totalStops"], 3);
    assert_eq!(detail["completedStops"], 0);
    assert_eq!(detail["totalPackages"], 2);
    assert_eq!(detail["deliveredPackages"], 1);
    assert_eq!(detail["stops"].as_array().expect("stops").len(), 3);
    assert_eq!(detail["packages"].as_array().expect("packages").len(), 2);

    // Counters always equal the child-row counts.
    let route_id: uuid::Uuid = route_id.parse().expect("route uuid");
    let snapshot = repos.route_snapshot(route_id).expect("route exists");
    assert_eq!(snapshot.total_stops, 3);
    assert_eq!(snapshot.total_packages, 2);
}

#[actix_web::test]
async fn a_delivered_package_stays_delivered_under_more_scans() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "driver@example.com").await;
    let route_id = create_route(&app, &token, "Scan Loop").await;

    post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/packages"),
        json!({ "trackingNumber": "TBA1", "barcode": "LOOP" }),
    )
    .await;

    let scan_uri = format!("/api/routes/{route_id}/packages/scan");
    let mut delivered_at = Value::Null;
    for expected in ["OUT_FOR_DELIVERY", "DELIVERED", "DELIVERED", "DELIVERED"] {
        let (status, body) = post_json(&app, &token, &scan_uri, json!({ "barcode": "LOOP" })).await;
        assert_eq!(status, 200);
        assert_eq!(body["package"]["status"], expected);
        assert_eq!(
            body["route"]["deliveredPackages"], 1,
            "no double counting once delivered"
        );
        if expected == "DELIVERED" {
            if delivered_at.is_null() {
                delivered_at = body["package"]["deliveredAt"].clone();
            } else {
                // The timestamp is stamped once and never overwritten.
                assert_eq!(body["package"]["deliveredAt"], delivered_at);
            }
        }
    }
}

#[actix_web::test]
async fn scanning_an_unknown_barcode_is_not_found() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "driver@example.com").await;
    let route_id = create_route(&app, &token, "Empty Route").await;

    let (status, body) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/packages/scan"),
        json!({ "barcode": "GHOST" }),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], "not_found");
}

#[actix_web::test]
async fn completing_a_stop_twice_counts_once_and_keeps_the_first_timestamp() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "driver@example.com").await;
    let route_id = create_route(&app, &token, "Repeat Complete").await;

    let (_, stop) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/stops"),
        json!({ "address": "1 High Street" }),
    )
    .await;
    let stop_id = stop["id"].as_str().expect("stop id");
    let stop_uri = format!("/api/routes/{route_id}/stops/{stop_id}");

    let (status, first) = patch_json(&app, &token, &stop_uri, json!({ "status": "COMPLETED" })).await;
    assert_eq!(status, 200);
    assert_eq!(first["route"]["completedStops"], 1);
    let completed_at = first["stop"]["completedAt"].clone();
    assert!(!completed_at.is_null());

    let (status, second) =
        patch_json(&app, &token, &stop_uri, json!({ "status": "COMPLETED" })).await;
    assert_eq!(status, 200);
    assert_eq!(second["route"]["completedStops"], 1, "no double counting");
    assert_eq!(second["stop"]["completedAt"], completed_at);
}

#[actix_web::test]
async fn reverting_a_completed_stop_never_decrements_the_counter() {
    // The shipped CountOnce policy: once counted, always counted.
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "driver@example.com").await;
    let route_id = create_route(&app, &token, "Revert").await;

    let (_, stop) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/stops"),
        json!({ "address": "1 High Street" }),
    )
    .await;
    let stop_id = stop["id"].as_str().expect("stop id");
    let stop_uri = format!("/api/routes/{route_id}/stops/{stop_id}");

    patch_json(&app, &token, &stop_uri, json!({ "status": "COMPLETED" })).await;
    let (_, reverted) = patch_json(&app, &token, &stop_uri, json!({ "status": "PENDING" })).await;
    assert_eq!(reverted["route"]["completedStops"], 1);

    // Re-completing does not double count either.
    let (_, recompleted) =
        patch_json(&app, &token, &stop_uri, json!({ "status": "COMPLETED" })).await;
    assert_eq!(recompleted["route"]["completedStops"], 1);
}

#[actix_web::test]
async fn arrival_timestamps_follow_the_stamp_once_rule() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "driver@example.com").await;
    let route_id = create_route(&app, &token, "Arrivals").await;

    let (_, stop) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/stops"),
        json!({ "address": "1 High Street" }),
    )
    .await;
    let stop_id = stop["id"].as_str().expect("stop id");
    let stop_uri = format!("/api/routes/{route_id}/stops/{stop_id}");

    let (_, arrived) = patch_json(&app, &token, &stop_uri, json!({ "status": "ARRIVED" })).await;
    let arrived_at = arrived["stop"]["arrivedAt"].clone();
    assert!(!arrived_at.is_null());

    let (_, again) = patch_json(&app, &token, &stop_uri, json!({ "status": "ARRIVED" })).await;
    assert_eq!(again["stop"]["arrivedAt"], arrived_at);
}

#[actix_web::test]
async fn explicit_sequences_are_honoured_and_appends_continue_after_them() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "driver@example.com").await;
    let route_id = create_route(&app, &token, "Sequencing").await;

    let (_, explicit) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/stops"),
        json!({ "address": "10 High Street", "sequence": 10 }),
    )
    .await;
    assert_eq!(explicit["sequence"], 10);

    let (_, appended) = post_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/stops"),
        json!({ "address": "11 High Street" }),
    )
    .await;
    assert_eq!(appended["sequence"], 11);
}

#[actix_web::test]
async fn route_status_transitions_stamp_started_and_completed_once() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "driver@example.com").await;
    let route_id = create_route(&app, &token, "Lifecycle").await;
    let status_uri = format!("/api/routes/{route_id}/status");

    let (_, started) =
        patch_json(&app, &token, &status_uri, json!({ "status": "IN_PROGRESS" })).await;
    let started_at = started["startedAt"].clone();
    assert!(!started_at.is_null());

    let (_, completed) =
        patch_json(&app, &token, &status_uri, json!({ "status": "COMPLETED" })).await;
    assert!(!completed["completedAt"].is_null());
    assert_eq!(completed["startedAt"], started_at);

    // There is deliberately no completeness gate: the route completed
    // with zero stops completed.
    assert_eq!(completed["completedStops"], 0);
}

#[actix_web::test]
async fn routes_are_invisible_to_other_workers() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (owner_token, _owner) = register_user(&app, "owner@example.com").await;
    let (intruder_token, _intruder) = register_user(&app, "intruder@example.com").await;
    let route_id = create_route(&app, &owner_token, "Private").await;

    let (status, _) = get_json(&app, &intruder_token, &format!("/api/routes/{route_id}")).await;
    assert_eq!(status, 404);

    let (status, _) = patch_json(
        &app,
        &intruder_token,
        &format!("/api/routes/{route_id}/status"),
        json!({ "status": "CANCELLED" }),
    )
    .await;
    assert_eq!(status, 404);
}

#[actix_web::test]
async fn packages_validate_their_stop_and_barcode() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "driver@example.com").await;
    let route_id = create_route(&app, &token, "Validation").await;
    let packages_uri = format!("/api/routes/{route_id}/packages");

    // Unknown stop.
    let (status, body) = post_json(
        &app,
        &token,
        &packages_uri,
        json!({ "trackingNumber": "TBA1", "stopId": uuid::Uuid::new_v4() }),
    )
    .await;
    assert_eq!(status, 404, "{body}");

    // Duplicate barcode within the route.
    post_json(
        &app,
        &token,
        &packages_uri,
        json!({ "trackingNumber": "TBA1", "barcode": "DUP" }),
    )
    .await;
    let (status, body) = post_json(
        &app,
        &token,
        &packages_uri,
        json!({ "trackingNumber": "TBA2", "barcode": "DUP" }),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["code"], "conflict");
}

#[actix_web::test]
async fn package_listing_filters_by_status() {
    let (state, _repos) = fresh_state();
    let app = test::init_service(build_test_app(state)).await;
    let (token, _user) = register_user(&app, "driver@example.com").await;
    let route_id = create_route(&app, &token, "Filters").await;
    let packages_uri = format!("/api/routes/{route_id}/packages");

    post_json(
        &app,
        &token,
        &packages_uri,
        json!({ "trackingNumber": "TBA1", "barcode": "A" }),
    )
    .await;
    post_json(
        &app,
        &token,
        &packages_uri,
        json!({ "trackingNumber": "TBA2", "barcode": "B" }),
    )
    .await;
    // Deliver package A via explicit status update.
    let (_, detail) = get_json(&app, &token, &format!("/api/routes/{route_id}")).await;
    let package_id = detail["packages"][0]["id"].as_str().expect("package id");
    let (status, delivered) = patch_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/packages/{package_id}"),
        json!({ "status": "DELIVERED", "recipientName": "Sam" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(delivered["package"]["recipientName"], "Sam");
    assert_eq!(delivered["route"]["deliveredPackages"], 1);

    let (status, filtered) = get_json(
        &app,
        &token,
        &format!("/api/routes/{route_id}/packages?status=DELIVERED"),
    )
    .await;
    assert_eq!(status, 200);
    let filtered = filtered.as_array().expect("array");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["id"], package_id);
}
