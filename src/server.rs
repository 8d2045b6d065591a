//! HTTP envelope around the audit pipeline.
//!
//! A single endpoint, `POST /api/seo`, accepts `{ "url": ..., "singlePage": ... }`
//! and answers with a `SiteReport` or `{ "error": ... }`.

use crate::Audit;
use crate::config::AuditConfig;
use crate::crawlers::fetch::Fetcher;
use crate::render::Renderer;
use crate::utils::validate_target;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::error::Error;
use std::sync::Arc;

/// Shared by every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuditConfig>,
    pub fetcher: Option<Arc<dyn Fetcher>>,
    pub renderer: Option<Arc<dyn Renderer>>,
}

impl AppState {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config: Arc::new(config),
            fetcher: None,
            renderer: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    pub url: Option<String>,
    pub single_page: Option<bool>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/seo", post(audit_handler))
        .with_state(state)
}

/// Listen on the configured address until the process is stopped
pub async fn serve(config: AuditConfig) -> Result<(), Box<dyn Error>> {
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    ::log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(AppState::new(config))).await?;
    Ok(())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub async fn audit_handler(
    State(state): State<AppState>,
    payload: Result<Json<AuditRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    // Reject bad input before anything touches the network
    let target = match validate_target(request.url.as_deref()) {
        Ok(target) => target,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    ::log::info!("Audit requested for {}", target);

    let mut audit = Audit::new(target.as_str())
        .with_config(state.config.as_ref().clone())
        .single_page(request.single_page.unwrap_or(false));
    if let Some(fetcher) = &state.fetcher {
        audit = audit.with_fetcher(Arc::clone(fetcher));
    }
    if let Some(renderer) = &state.renderer {
        audit = audit.with_renderer(Arc::clone(renderer));
    }

    match audit.run().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) if e.is_client_error() => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            ::log::error!("Audit of {} failed: {}", target, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
