// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Leaderboard HTTP tests against an offline database.
//!
//! Parameter errors must be reported as `invalid_parameter` before any
//! database access; once parameters are valid the offline database fails
//! with a 500.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn get(uri: &str) -> axum::response::Response {
    let (app, _) = common::create_test_app();
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_invalid_parameters_rejected_before_database() {
    let cases = [
        "/api/v2/leaderboard?stat=stardust",
        "/api/v2/leaderboard?stat=no_such_stat",
        "/api/v2/leaderboard?mode=sometimes",
        "/api/v2/leaderboard?limit=0",
        "/api/v2/leaderboard?limit=-5",
        "/api/v2/leaderboard?offset=abc",
        "/api/v2/leaderboard?focus=me",
        "/api/v2/leaderboard?faction=rocket",
        "/api/v2/communities/somewhere/leaderboard?stat=gymbadges_total",
        "/api/v2/communities/somewhere/leaderboard?limit=0",
        "/api/v2/communities/somewhere/leaderboard?mode=best",
    ];

    for uri in cases {
        let response = get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = common::json_body(response).await;
        assert_eq!(body["error"], "invalid_parameter", "{}", uri);
    }
}

#[tokio::test]
async fn test_valid_parameters_reach_database() {
    for uri in [
        "/api/v2/leaderboard",
        "/api/v2/leaderboard?stat=travel_km&mode=legacy&faction=mystic&country=us",
        "/api/v2/leaderboard?limit=5000",
        "/api/v2/communities/somewhere/leaderboard",
    ] {
        let response = get(uri).await;
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "{}",
            uri
        );
    }
}

#[tokio::test]
async fn test_stats_metadata() {
    let response = get("/api/v2/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::json_body(response).await;
    assert_eq!(body["default"], "total_xp");

    let stats = body["stats"].as_array().unwrap();
    let stardust = stats.iter().find(|s| s["name"] == "stardust").unwrap();
    assert_eq!(stardust["reversable"], true);
    assert_eq!(stardust["sortable"], false);

    let travel = stats.iter().find(|s| s["name"] == "travel_km").unwrap();
    assert_eq!(travel["kind"], "decimal");

    let gen1 = stats.iter().find(|s| s["name"] == "pokedex_gen1").unwrap();
    assert_eq!(gen1["max"], 151);
}
