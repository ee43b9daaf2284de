//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use outlay_core::{Expense, ExpenseFilter, ExpenseId, NewExpense};

use crate::{AppError, AppState};

/// GET /api/expenses - List expenses, newest first
///
/// Query parameters: `start_date`, `end_date` (inclusive, `YYYY-MM-DD`) and
/// `category`.
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = outlay_storage::list_expenses(&state.db, &filter)
        .await
        .map_err(AppError::from_store)?;
    Ok(Json(expenses))
}

/// POST /api/expenses - Record a single expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Json(expense): Json<NewExpense>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let saved = outlay_storage::insert_expense(&state.db, &expense)
        .await
        .map_err(AppError::from_store)?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// GET /api/expenses/{id}
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, AppError> {
    outlay_storage::get_expense(&state.db, ExpenseId(id))
        .await
        .map_err(AppError::from_store)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Expense not found"))
}

/// PUT /api/expenses/{id}
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(expense): Json<NewExpense>,
) -> Result<Json<Expense>, AppError> {
    let updated = outlay_storage::update_expense(&state.db, ExpenseId(id), &expense)
        .await
        .map_err(AppError::from_store)?;
    Ok(Json(updated))
}

/// DELETE /api/expenses/{id}
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    outlay_storage::delete_expense(&state.db, ExpenseId(id))
        .await
        .map_err(AppError::from_store)?;
    Ok(StatusCode::NO_CONTENT)
}
