//! Outlay web server
//!
//! Axum REST API over the expense store: manual expense CRUD, CSV import
//! preview and confirmation, and management of keyword categorization rules.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::error;

use outlay_storage::{DbPool, StoreError};

pub mod config;
mod handlers;

pub use config::ServerConfig;

/// Room for multipart boundaries and part headers on top of the file itself.
pub const MULTIPART_HEADROOM: usize = 64 * 1024;

pub struct AppState {
    pub db: DbPool,
    pub config: ServerConfig,
}

pub fn create_router(db: DbPool, config: ServerConfig) -> Router {
    let body_limit = config.max_upload_bytes.saturating_add(MULTIPART_HEADROOM);
    let cors = cors_layer(&config.allowed_origins);
    let state = Arc::new(AppState { db, config });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/expenses/{id}",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        .route("/import/csv", post(handlers::import_csv))
        .route("/import/confirm", post(handlers::confirm_import))
        .route(
            "/categorization-rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route(
            "/categorization-rules/{id}",
            axum::routing::put(handlers::update_rule).delete(handlers::delete_rule),
        )
        .route("/categories", get(handlers::list_categories));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    if allowed_origins.is_empty() {
        // Same-origin only
        return CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE]);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE])
}

// ============================================================================
// Error Handling
// ============================================================================

/// Handler error: the status and message sent to the client, plus the full
/// error for the log when the message is deliberately generic.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, msg)
    }

    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Store errors with a client-facing meaning keep their message; the rest
    /// become a generic 500.
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::ExpenseNotFound(_) => Self::not_found("Expense not found"),
            StoreError::RuleNotFound(_) => Self::not_found("Rule not found"),
            StoreError::InvalidExpense(e) => Self::bad_request(&e.to_string()),
            StoreError::InvalidRule(e) => Self::bad_request(&e.to_string()),
            other => Self::from(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err.into()),
        }
    }
}
