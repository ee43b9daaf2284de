//! CSV import handlers: preview a statement, then confirm the reviewed rows

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Json,
};
use outlay_core::{Expense, Money, NewExpense};
use outlay_import::{import::preview_csv, ImportError};
use serde::Serialize;
use tracing::info;

use crate::{AppError, AppState};

/// Multipart field carrying the uploaded statement.
pub const CSV_FIELD: &str = "csv";

#[derive(Debug, Serialize)]
pub struct ImportPreviewResponse {
    pub success: bool,
    pub expenses: Vec<NewExpense>,
    pub count: usize,
    pub filename: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmImportResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub total: Money,
    pub expenses: Vec<Expense>,
}

fn import_error(err: ImportError) -> AppError {
    match err {
        ImportError::NotCsv(_) => AppError::bad_request("File must be a CSV"),
        ImportError::TooLarge { limit, .. } => AppError::bad_request(&format!(
            "File too large. Maximum size is {} MB",
            limit / 1024 / 1024
        )),
        other => AppError::bad_request(&format!("Failed to parse CSV: {other}")),
    }
}

/// POST /api/import/csv - Parse and categorize a CSV statement without saving
///
/// Expects a multipart form with the file in the `csv` field.
pub async fn import_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ImportPreviewResponse>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(&format!("Failed to read form field: {}", e)))?
    {
        if field.name() != Some(CSV_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::bad_request("Failed to read file data"))?;
        upload = Some((filename, bytes));
    }

    let (filename, data) = upload.ok_or_else(|| AppError::bad_request("No CSV file provided"))?;
    info!(filename = %filename, size = data.len(), "Previewing CSV import");

    // One snapshot for the whole file; a failed read categorizes everything as "Other".
    let rules = outlay_storage::get_ordered_category_rules(&state.db).await;
    let parsed = preview_csv(
        &data[..],
        &filename,
        data.len(),
        state.config.max_upload_bytes,
        &rules,
    )
    .map_err(import_error)?;

    let count = parsed.expenses.len();
    info!(
        filename = %filename,
        count,
        skipped = parsed.errors.len(),
        "Parsed CSV import"
    );

    Ok(Json(ImportPreviewResponse {
        success: true,
        message: format!("Successfully parsed {count} transactions"),
        expenses: parsed.expenses,
        count,
        filename,
    }))
}

/// POST /api/import/confirm - Persist previewed expenses in one transaction
pub async fn confirm_import(
    State(state): State<Arc<AppState>>,
    Json(expenses): Json<Vec<NewExpense>>,
) -> Result<Json<ConfirmImportResponse>, AppError> {
    if expenses.is_empty() {
        return Err(AppError::bad_request("No expenses to import"));
    }

    let saved = outlay_storage::bulk_insert_expenses(&state.db, &expenses)
        .await
        .map_err(AppError::from_store)?;
    let total: Money = saved.iter().map(|e| e.amount).sum();
    info!(count = saved.len(), total = %total, "Confirmed CSV import");

    Ok(Json(ConfirmImportResponse {
        success: true,
        message: "Successfully imported expenses to database".to_string(),
        count: saved.len(),
        total,
        expenses: saved,
    }))
}
