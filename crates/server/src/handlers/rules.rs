//! Categorization rule handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use outlay_core::{CategoryRule, RuleId};
use serde::Deserialize;

use crate::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct RuleQuery {
    pub category: Option<String>,
}

/// GET /api/categorization-rules - List rules, optionally for one category
pub async fn list_rules(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RuleQuery>,
) -> Result<Json<Vec<CategoryRule>>, AppError> {
    let rules = outlay_storage::list_category_rules(&state.db, query.category.as_deref())
        .await
        .map_err(AppError::from_store)?;
    Ok(Json(rules))
}

/// POST /api/categorization-rules
pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    Json(rule): Json<CategoryRule>,
) -> Result<(StatusCode, Json<CategoryRule>), AppError> {
    let created = outlay_storage::create_category_rule(&state.db, &rule)
        .await
        .map_err(AppError::from_store)?;
    tracing::info!(category = %created.category, keyword = %created.keyword, "Created categorization rule");
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/categorization-rules/{id}
pub async fn update_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(rule): Json<CategoryRule>,
) -> Result<Json<CategoryRule>, AppError> {
    let updated = outlay_storage::update_category_rule(&state.db, RuleId(id), &rule)
        .await
        .map_err(AppError::from_store)?;
    Ok(Json(updated))
}

/// DELETE /api/categorization-rules/{id}
pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    outlay_storage::delete_category_rule(&state.db, RuleId(id))
        .await
        .map_err(AppError::from_store)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/categories - Distinct categories that have rules
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    let categories = outlay_storage::list_categories(&state.db)
        .await
        .map_err(AppError::from_store)?;
    Ok(Json(categories))
}
