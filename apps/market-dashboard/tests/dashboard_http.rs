//! Dashboard HTTP Integration Tests
//!
//! Loads CSV fixtures from a temporary directory and drives the router
//! end to end.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use market_dashboard::infrastructure::config::{DashboardConfig, GroupSettings};
use market_dashboard::infrastructure::http::{AppState, DashboardServer, create_router};
use market_dashboard::load_service;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

const LONG_CSV: &str = "\
Date,Symbol,Close
2024-01-02,AAPL,185.64
2024-01-03,AAPL,184.25
2024-01-04,AAPL,181.91
2024-01-05,AAPL,181.18
2024-01-08,AAPL,185.56
2024-01-02,MSFT,370.87
2024-01-03,MSFT,370.60
2024-01-04,MSFT,not-a-price
2024-01-05,MSFT,367.75
2024-01-08,MSFT,374.69
";

const WIDE_CSV: &str = "\
date,XOM,GLD
2024-01-02,102.15,190.13
2024-01-03,103.81,189.37
2024-01-04,102.69,188.44
2024-01-05,103.04,188.24
2024-01-08,100.06,187.36
";

fn fixture_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a_stocks.csv"), LONG_CSV).unwrap();
    std::fs::write(dir.path().join("b_other.csv"), WIDE_CSV).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    dir
}

fn config_for(dir: &Path) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.data.dir = dir.to_path_buf();
    config.groups = vec![GroupSettings {
        name: "Tech".to_string(),
        assets: vec!["AAPL".to_string(), "MSFT".to_string()],
    }];
    config
}

async fn get(dir: &Path, uri: &str) -> (StatusCode, String) {
    let service = load_service(&config_for(dir)).unwrap();
    let app = create_router(Arc::new(AppState::new(service)));

    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn merges_every_csv_file() {
    let dir = fixture_dir();
    let (status, body) = get(dir.path(), "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["assets"], 4);
    assert_eq!(json["observations"], 19);
    assert_eq!(json["skipped_rows"], 1);
}

#[tokio::test]
async fn page_lists_skipped_rows() {
    let dir = fixture_dir();
    let (status, html) = get(dir.path(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("1 rows skipped while loading"));
    assert!(html.contains("a_stocks.csv:9"));
    assert!(html.contains("4 of 4 assets"));
}

#[tokio::test]
async fn group_selection_limits_summary() {
    let dir = fixture_dir();
    let (_, body) = get(dir.path(), "/api/summary?group=Tech").await;

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["assets"], serde_json::json!(["AAPL", "MSFT"]));
    assert_eq!(json["highlights"]["asset_count"], 2);
}

#[tokio::test]
async fn custom_range_narrows_window() {
    let dir = fixture_dir();
    let (_, body) = get(dir.path(), "/api/summary?from=2024-01-04&to=2024-01-08").await;

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["window"]["from"], "2024-01-04");
    assert_eq!(json["window"]["to"], "2024-01-08");
    assert_eq!(json["highlights"]["days_analysed"], 3);
}

#[tokio::test]
async fn correlation_reports_pairs() {
    let dir = fixture_dir();
    let (_, body) = get(dir.path(), "/api/correlation").await;

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["assets"].as_array().unwrap().len(), 4);
    assert_eq!(json["most_correlated"].as_array().unwrap().len(), 3);
    assert_eq!(json["least_correlated"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn metrics_export_follows_filter() {
    let dir = fixture_dir();
    let (status, csv) = get(dir.path(), "/export/metrics.csv?q=xo&columns=initial_price").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(csv, "asset,initial_price\nXOM,102.15\n");
}

#[tokio::test]
async fn server_binds_and_stops_on_cancel() {
    let dir = fixture_dir();
    let service = load_service(&config_for(dir.path())).unwrap();
    let cancel = CancellationToken::new();

    let bound = DashboardServer::new(
        "127.0.0.1:0".parse().unwrap(),
        Arc::new(AppState::new(service)),
        cancel.clone(),
    )
    .bind()
    .await
    .unwrap();
    assert_ne!(bound.local_addr().unwrap().port(), 0);

    let handle = tokio::spawn(bound.serve());
    cancel.cancel();
    handle.await.unwrap().unwrap();
}
