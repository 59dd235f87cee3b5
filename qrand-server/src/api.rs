// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! HTTP surface: authentication, validation and response shaping
//!
//! Handlers stay thin. All bit generation, backend selection and fallback
//! happen in `qrand_core::generator`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE};
use qrand_core::{
    metrics::Metrics, BitRequest, Error, QuantumGenerator, ServiceConfig,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

const API_KEY_HEADER: &str = "x-api-key";
const BITS_GENERATED_HEADER: HeaderName = HeaderName::from_static("x-bits-generated");
const BACKEND_HEADER: HeaderName = HeaderName::from_static("x-backend");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServiceConfig>,
    generator: QuantumGenerator,
    metrics: Metrics,
    start_time: Instant,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> qrand_core::Result<Self> {
        let generator = QuantumGenerator::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            generator,
            metrics: Metrics::new(),
            start_time: Instant::now(),
        })
    }
}

/// JSON error body in the `{"detail": ...}` shape clients already parse
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match &e {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Authentication => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Compare `X-API-Key` against the configured secret
fn verify_api_key(headers: &HeaderMap, config: &ServiceConfig) -> qrand_core::Result<()> {
    let expected = config.api_key().ok_or(Error::AuthNotConfigured)?;

    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(Error::Authentication)?;

    if provided != expected {
        return Err(Error::Authentication);
    }
    Ok(())
}

/// POST /quantum-random - Generate random bits
#[instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
async fn quantum_random(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<BitRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let start = Instant::now();

    if let Err(e) = verify_api_key(&headers, &state.config) {
        warn!("Rejected request: {}", e);
        state.metrics.record_rejection();
        return Err(e.into());
    }

    let Json(request) = payload.map_err(|rejection| {
        state.metrics.record_rejection();
        ApiError::bad_request(rejection.body_text())
    })?;

    if let Err(e) = request.validate() {
        state.metrics.record_rejection();
        return Err(e.into());
    }

    let generation = state.generator.generate(&request).await.map_err(|e| {
        error!("Generation failed: {}", e);
        if e.is_validation_error() {
            state.metrics.record_rejection();
        } else {
            state.metrics.record_failure();
        }
        ApiError::from(e)
    })?;

    state
        .metrics
        .record_generation(&generation, start.elapsed().as_micros() as u64);

    info!(
        n_bits = generation.n_bits,
        backend = %generation.backend,
        fallback = generation.fell_back(),
        "Served {} bytes",
        generation.bytes.len()
    );

    let mut response = generation.bytes.clone().into_response();
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(generation.bytes.len()));
    headers.insert(BITS_GENERATED_HEADER, HeaderValue::from(generation.n_bits));
    headers.insert(
        BACKEND_HEADER,
        HeaderValue::from_static(generation.backend.label()),
    );

    Ok(response)
}

/// GET / - Liveness
async fn root() -> Json<Value> {
    Json(json!({
        "message": "Quantum Random Number Generator API",
        "status": "running",
    }))
}

/// GET /health - Health check with backend info
async fn health(State(state): State<AppState>) -> Json<Value> {
    let hardware = if state.generator.has_hardware() {
        "configured"
    } else {
        "not configured"
    };

    Json(json!({
        "status": "healthy",
        "version": qrand_core::VERSION,
        "current_backend": state.generator.default_backend().label(),
        "qubits": state.generator.width().get(),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "backends": {
            "sim": "available",
            "qpu": hardware,
        },
    }))
}

/// GET /metrics - Prometheus metrics
async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.prometheus_format()
}

/// Build the service router
pub fn router(state: AppState) -> Router {
    // Leave headroom above the hardware bound so fallback can still complete.
    let request_timeout = state.config.hardware_timeout().saturating_mul(2);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/quantum-random", post(quantum_random))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
