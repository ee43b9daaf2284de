//! HTTP request handlers organized by domain

pub mod expenses;
pub mod import;
pub mod rules;

pub use expenses::*;
pub use import::*;
pub use rules::*;

use axum::Json;
use serde_json::{json, Value};

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
