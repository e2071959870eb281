//! HTTP surface: the rendered dashboard at `/`, or the placeholder message.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::compose::ReportPage;
use crate::report::{render_report, OutputFormat};

pub const PLACEHOLDER_MESSAGE: &str = "IRB Validation Dashboard Placeholder";

/// What the root endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeMode {
    #[default]
    Dashboard,
    Placeholder,
}

/// Pre-rendered documents shared read-only across requests.
#[derive(Debug, Clone)]
pub struct DashboardState {
    html: Arc<str>,
    json: Arc<str>,
}

impl DashboardState {
    /// Render the page once in both formats.
    pub fn from_page(page: &ReportPage) -> Result<Self> {
        Ok(Self {
            html: render_report(page, OutputFormat::Html)?.into(),
            json: render_report(page, OutputFormat::Json)?.into(),
        })
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/report", get(report_json))
        .route("/healthz", get(healthz))
        .with_state(state)
}

pub fn placeholder_router() -> Router {
    Router::new()
        .route("/", get(placeholder))
        .route("/healthz", get(healthz))
}

async fn index(State(state): State<DashboardState>) -> Html<String> {
    Html(state.html.to_string())
}

async fn report_json(State(state): State<DashboardState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.json.to_string(),
    )
}

async fn placeholder() -> Json<serde_json::Value> {
    Json(json!({ "message": PLACEHOLDER_MESSAGE }))
}

async fn healthz() -> &'static str {
    "ok"
}

/// Bind `addr` and serve `router` until ctrl-c.
pub async fn serve(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind dashboard listener on {addr}"))?;
    let local = listener.local_addr().context("listener has no local address")?;
    info!(addr = %local, "serving dashboard");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("dashboard server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
