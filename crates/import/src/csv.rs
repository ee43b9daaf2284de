use csv::StringRecord;
use outlay_core::{NewExpense, CSV_PAYMENT_METHOD};
use std::collections::HashMap;
use std::io::Read;
use thiserror::Error;

use crate::categorize::Categorizer;
use crate::normalize::{self, AmountProblem};

pub const TRANSACTION_DATE: &str = "TRANSACTION_DATE";
pub const DESCRIPTION: &str = "DESCRIPTION";
pub const AMOUNT: &str = "AMOUNT";
pub const LOCATION: &str = "LOCATION";
pub const CREDIT_CARD: &str = "CREDIT_CARD";

pub const REQUIRED_COLUMNS: [&str; 3] = [TRANSACTION_DATE, DESCRIPTION, AMOUNT];

/// Upload ceiling for a single CSV file (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Why a single data row was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowErrorKind {
    #[error("failed to read record: {0}")]
    MalformedRow(String),
    #[error("empty transaction date")]
    EmptyDate,
    #[error("invalid date format '{0}'")]
    InvalidDate(String),
    #[error("empty description")]
    EmptyDescription,
    #[error("empty amount")]
    EmptyAmount,
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    #[error("amount '{0}' is outside -999999.99 to 999999.99")]
    AmountOutOfRange(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {kind}")]
pub struct RowError {
    pub line: u64,
    pub kind: RowErrorKind,
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("failed to read header row: {0}")]
    Header(#[from] csv::Error),
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("no data rows")]
    EmptyFile,
    #[error("failed to parse any valid expenses. Errors: {}", join_row_errors(.0))]
    NoValidRecords(Vec<RowError>),
    #[error("file must be a CSV: {0}")]
    NotCsv(String),
    #[error("file is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },
}

pub fn join_row_errors(errors: &[RowError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcome of a successful parse: records in file order plus the rows that
/// were skipped along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedImport {
    pub expenses: Vec<NewExpense>,
    pub errors: Vec<RowError>,
}

/// Normalized column name to position, built from the header row.
#[derive(Debug, Clone)]
pub struct HeaderMap {
    columns: HashMap<String, usize>,
    width: usize,
}

impl HeaderMap {
    pub fn from_record(record: &StringRecord) -> Self {
        let columns = record
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_uppercase(), idx))
            .collect();
        HeaderMap {
            columns,
            width: record.len(),
        }
    }

    pub fn require(&self, required: &[&'static str]) -> Result<(), ImportError> {
        match required.iter().find(|col| !self.columns.contains_key(**col)) {
            Some(col) => Err(ImportError::MissingColumn(*col)),
            None => Ok(()),
        }
    }

    pub fn index(&self, column: &str) -> Option<usize> {
        self.columns.get(column).copied()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Trimmed cell value; empty when the column or cell is absent.
    pub fn field<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.index(column)
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .unwrap_or_default()
    }

    /// Trimmed cell value, `None` when the column is absent or the cell is blank.
    pub fn optional<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        Some(self.field(record, column)).filter(|s| !s.is_empty())
    }
}

/// Values derived from the optional `LOCATION` and `CREDIT_CARD` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalFields {
    pub vendor: Option<String>,
    pub payment_method: String,
}

pub fn optional_fields(headers: &HeaderMap, record: &StringRecord) -> OptionalFields {
    OptionalFields {
        vendor: headers.optional(record, LOCATION).map(str::to_string),
        payment_method: headers
            .optional(record, CREDIT_CARD)
            .unwrap_or(CSV_PAYMENT_METHOD)
            .to_string(),
    }
}

/// Validates the upload's name and size before any parsing happens.
pub fn check_upload(filename: &str, size: usize, limit: usize) -> Result<(), ImportError> {
    if !filename.to_lowercase().ends_with(".csv") {
        return Err(ImportError::NotCsv(filename.to_string()));
    }
    if size > limit {
        return Err(ImportError::TooLarge { size, limit });
    }
    Ok(())
}

fn is_blank(record: &StringRecord) -> bool {
    match record.len() {
        0 => true,
        1 => record.get(0).unwrap_or_default().trim().is_empty(),
        _ => false,
    }
}

fn parse_record(
    record: &StringRecord,
    headers: &HeaderMap,
    categorizer: &Categorizer,
) -> Result<NewExpense, RowErrorKind> {
    let date_str = headers.field(record, TRANSACTION_DATE);
    if date_str.is_empty() {
        return Err(RowErrorKind::EmptyDate);
    }
    let date = normalize::parse_date(date_str)
        .ok_or_else(|| RowErrorKind::InvalidDate(date_str.to_string()))?;

    let description = headers.field(record, DESCRIPTION);
    if description.is_empty() {
        return Err(RowErrorKind::EmptyDescription);
    }

    let amount_str = headers.field(record, AMOUNT);
    if amount_str.is_empty() {
        return Err(RowErrorKind::EmptyAmount);
    }
    let amount = normalize::parse_amount(amount_str).map_err(|problem| match problem {
        AmountProblem::Unparseable => RowErrorKind::InvalidAmount(amount_str.to_string()),
        AmountProblem::OutOfRange => RowErrorKind::AmountOutOfRange(amount_str.to_string()),
    })?;

    let OptionalFields {
        vendor,
        payment_method,
    } = optional_fields(headers, record);

    Ok(NewExpense {
        date,
        category: categorizer.categorize(description).to_string(),
        description: description.to_string(),
        amount,
        vendor,
        payment_method,
    })
}

/// Parses an uploaded expense export.
///
/// The first record is the header and must name `TRANSACTION_DATE`,
/// `DESCRIPTION` and `AMOUNT` (case and surrounding whitespace ignored).
/// Every later record is parsed independently: a bad row is recorded in
/// [`ParsedImport::errors`] and skipped. Fails only when the header is
/// unusable, when there are no data rows, or when every data row failed.
pub fn parse_csv<R: Read>(data: R, categorizer: &Categorizer) -> Result<ParsedImport, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);
    let mut records = reader.records();

    let headers = match records.next() {
        Some(result) => HeaderMap::from_record(&result?),
        None => return Err(ImportError::EmptyFile),
    };
    headers.require(&REQUIRED_COLUMNS)?;

    // The header is line 1.
    let parsed = records
        .enumerate()
        .fold(ParsedImport::default(), |mut acc, (idx, result)| {
            let line = idx as u64 + 2;
            let outcome = match result {
                Err(e) => Err(RowErrorKind::MalformedRow(e.to_string())),
                Ok(record) if is_blank(&record) => return acc,
                Ok(record) if record.len() != headers.width() => {
                    Err(RowErrorKind::MalformedRow(format!(
                        "expected {} fields, found {}",
                        headers.width(),
                        record.len()
                    )))
                }
                Ok(record) => parse_record(&record, &headers, categorizer),
            };
            match outcome {
                Ok(expense) => acc.expenses.push(expense),
                Err(kind) => acc.errors.push(RowError { line, kind }),
            }
            acc
        });

    if parsed.expenses.is_empty() {
        if parsed.errors.is_empty() {
            return Err(ImportError::EmptyFile);
        }
        return Err(ImportError::NoValidRecords(parsed.errors));
    }

    if !parsed.errors.is_empty() {
        tracing::warn!(
            valid = parsed.expenses.len(),
            rejected = parsed.errors.len(),
            errors = %join_row_errors(&parsed.errors),
            "Parsed CSV with row errors"
        );
    }

    Ok(parsed)
}
