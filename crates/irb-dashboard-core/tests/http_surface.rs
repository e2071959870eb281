use std::net::SocketAddr;

use axum::Router;
use irb_dashboard_core::{
    compose,
    server::{dashboard_router, placeholder_router},
    DashboardState, LayoutOptions, MetricsStore, StylePolicy, PLACEHOLDER_MESSAGE,
};
use tokio::net::TcpListener;

async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn sample_state() -> DashboardState {
    let store = MetricsStore::sample();
    let page = compose(
        &store,
        store.findings(),
        &LayoutOptions::default(),
        &StylePolicy::default(),
    )
    .unwrap();
    DashboardState::from_page(&page).unwrap()
}

#[tokio::test(flavor = "current_thread")]
async fn root_serves_rendered_dashboard() {
    let state = sample_state();
    let expected = state.html().to_string();
    let addr = spawn(dashboard_router(state)).await;

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), 200);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "{content_type}");
    let body = response.text().await.unwrap();
    assert!(!body.is_empty());
    assert_eq!(body, expected);
}

#[tokio::test(flavor = "current_thread")]
async fn report_endpoint_serves_json_page() {
    let addr = spawn(dashboard_router(sample_state())).await;

    let response = reqwest::get(format!("http://{addr}/api/report")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(body["kpis"][5]["badge"], "4 RED | 1 AMBER");
}

#[tokio::test(flavor = "current_thread")]
async fn placeholder_root_returns_static_message() {
    let addr = spawn(placeholder_router()).await;

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = serde_json::from_str(&response.text().await.unwrap()).unwrap();
    assert_eq!(body, serde_json::json!({ "message": PLACEHOLDER_MESSAGE }));
    assert_eq!(PLACEHOLDER_MESSAGE, "IRB Validation Dashboard Placeholder");

    let missing = reqwest::get(format!("http://{addr}/api/report")).await.unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test(flavor = "current_thread")]
async fn health_endpoint_answers_in_both_modes() {
    for router in [dashboard_router(sample_state()), placeholder_router()] {
        let addr = spawn(router).await;
        let body = reqwest::get(format!("http://{addr}/healthz"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }
}
