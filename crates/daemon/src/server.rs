// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP routes of the Collector

use std::sync::{Arc, Mutex, MutexGuard};

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use iosnap_core::Clock;
use tokio::sync::Notify;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::protocol::{
    ErrorResponse, RecordingResponse, ShutdownResponse, StatusResponse, TelemetryResponse,
};
use crate::session::{Capture, Session};

/// Values reported by `/status` and used to build the CORS layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    /// Idle timeout in minutes
    pub timeout_minutes: u64,
    pub cors_origin: String,
}

/// Shared handler state
pub struct Collector<C: Clock> {
    session: Mutex<Session<C>>,
    settings: CollectorSettings,
    shutdown: Notify,
}

impl<C: Clock> Collector<C> {
    pub fn new(session: Session<C>, settings: CollectorSettings) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(session),
            settings,
            shutdown: Notify::new(),
        })
    }

    pub fn session(&self) -> MutexGuard<'_, Session<C>> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Ask the serve loop to stop; safe to call before anyone waits
    pub fn request_shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Resolves once [`Collector::request_shutdown`] has been called
    pub async fn shutdown_requested(&self) {
        self.shutdown.notified().await;
    }
}

/// Build the Collector router
pub fn router<C: Clock>(collector: Arc<Collector<C>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allow_origin(&collector.settings.cors_origin))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/record", post(record::<C>))
        .route("/stop", post(stop::<C>))
        .route("/telemetry", post(telemetry::<C>))
        .route("/status", get(status::<C>))
        .route("/shutdown", post(shutdown::<C>))
        .fallback(not_found)
        .layer(cors)
        .layer(middleware::from_fn(preflight_no_content))
        .layer(TraceLayer::new_for_http())
        .with_state(collector)
}

fn allow_origin(origin: &str) -> AllowOrigin {
    if origin == "*" {
        return AllowOrigin::any();
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(e) => {
            warn!(origin, error = %e, "invalid CORS origin, allowing any");
            AllowOrigin::any()
        }
    }
}

/// Preflight requests answer 204 rather than 200
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let preflight = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

async fn record<C: Clock>(State(collector): State<Arc<Collector<C>>>) -> Json<RecordingResponse> {
    collector.session().start_recording();
    Json(RecordingResponse { is_recording: true })
}

async fn stop<C: Clock>(State(collector): State<Arc<Collector<C>>>) -> Json<RecordingResponse> {
    collector.session().stop_recording();
    Json(RecordingResponse {
        is_recording: false,
    })
}

async fn telemetry<C: Clock>(
    State(collector): State<Arc<Collector<C>>>,
    body: Bytes,
) -> Response {
    if !collector.session().is_recording() {
        return Json(TelemetryResponse::not_recording()).into_response();
    }

    let record: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "rejected telemetry body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("Invalid JSON: {}", e))),
            )
                .into_response();
        }
    };

    // Recording may have stopped since the check above; capture re-checks
    let outcome = collector.session().capture(&record);
    match outcome {
        Ok(Capture::Captured(_)) => Json(TelemetryResponse::Captured).into_response(),
        Ok(Capture::Ignored) => Json(TelemetryResponse::not_recording()).into_response(),
        Err(e) => {
            error!(error = %e, "failed to append capture event");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

async fn status<C: Clock>(State(collector): State<Arc<Collector<C>>>) -> Json<StatusResponse> {
    let session = collector.session();
    Json(StatusResponse {
        is_recording: session.is_recording(),
        timeout: collector.settings.timeout_minutes,
        uptime: session.uptime().as_secs_f64(),
        captured: session.captured(),
        cors_origin: collector.settings.cors_origin.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn shutdown<C: Clock>(State(collector): State<Arc<Collector<C>>>) -> Json<ShutdownResponse> {
    info!("shutdown requested over HTTP");
    collector.request_shutdown();
    Json(ShutdownResponse::shutting_down())
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found")))
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
