use chrono::NaiveDate;
use outlay_core::{Expense, ExpenseError, ExpenseFilter, ExpenseId, Money, NewExpense};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db::{parse_timestamp, DbPool, StoreError};

type ExpenseRow = (
    i64,
    String,
    String,
    String,
    i64,
    Option<String>,
    String,
    String,
    String,
);

macro_rules! expense_columns {
    () => {
        "id, date, category, description, amount_cents, vendor, payment_method, created_at, updated_at"
    };
}

fn expense_from_row(r: ExpenseRow) -> Result<Expense, StoreError> {
    let date = NaiveDate::parse_from_str(&r.1, "%Y-%m-%d")
        .map_err(|_| StoreError::Corrupt(format!("expense {} date '{}'", r.0, r.1)))?;
    Ok(Expense {
        id: ExpenseId(r.0),
        date,
        category: r.2,
        description: r.3,
        amount: Money::from_cents(r.4),
        vendor: r.5,
        payment_method: r.6,
        created_at: parse_timestamp(&r.7)?,
        updated_at: parse_timestamp(&r.8)?,
    })
}

/// Validated amount in cents, the unit the `expenses` table stores.
fn checked_cents(expense: &NewExpense) -> Result<i64, StoreError> {
    expense.validate()?;
    expense
        .amount
        .to_cents()
        .ok_or_else(|| ExpenseError::AmountOutOfRange(expense.amount).into())
}

async fn insert_one(
    conn: &mut SqliteConnection,
    expense: &NewExpense,
) -> Result<Expense, StoreError> {
    let cents = checked_cents(expense)?;
    let row = sqlx::query_as::<_, ExpenseRow>(concat!(
        "INSERT INTO expenses (date, category, description, amount_cents, vendor, payment_method) ",
        "VALUES (?, ?, ?, ?, ?, ?) RETURNING ",
        expense_columns!()
    ))
    .bind(expense.date.format("%Y-%m-%d").to_string())
    .bind(&expense.category)
    .bind(&expense.description)
    .bind(cents)
    .bind(&expense.vendor)
    .bind(&expense.payment_method)
    .fetch_one(&mut *conn)
    .await?;

    expense_from_row(row)
}

pub async fn insert_expense(pool: &DbPool, expense: &NewExpense) -> Result<Expense, StoreError> {
    let mut conn = pool.acquire().await?;
    insert_one(&mut conn, expense).await
}

/// Inserts every expense in one transaction; nothing is written if any
/// expense is invalid or any insert fails.
pub async fn bulk_insert_expenses(
    pool: &DbPool,
    expenses: &[NewExpense],
) -> Result<Vec<Expense>, StoreError> {
    for expense in expenses {
        expense.validate()?;
    }

    let mut tx = pool.begin().await?;
    let mut saved = Vec::with_capacity(expenses.len());
    for expense in expenses {
        saved.push(insert_one(&mut *tx, expense).await?);
    }
    tx.commit().await?;

    tracing::info!(count = saved.len(), "Bulk inserted expenses");
    Ok(saved)
}

pub async fn get_expense(pool: &DbPool, id: ExpenseId) -> Result<Option<Expense>, StoreError> {
    let row = sqlx::query_as::<_, ExpenseRow>(concat!(
        "SELECT ",
        expense_columns!(),
        " FROM expenses WHERE id = ?"
    ))
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    row.map(expense_from_row).transpose()
}

/// Expenses matching `filter`, newest first.
pub async fn list_expenses(
    pool: &DbPool,
    filter: &ExpenseFilter,
) -> Result<Vec<Expense>, StoreError> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(concat!("SELECT ", expense_columns!(), " FROM expenses WHERE 1=1"));
    if let Some(start) = filter.start_date {
        qb.push(" AND date >= ").push_bind(start.format("%Y-%m-%d").to_string());
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND date <= ").push_bind(end.format("%Y-%m-%d").to_string());
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
    qb.push(" ORDER BY date DESC, id DESC");

    let rows = qb.build_query_as::<ExpenseRow>().fetch_all(pool).await?;
    rows.into_iter().map(expense_from_row).collect()
}

pub async fn update_expense(
    pool: &DbPool,
    id: ExpenseId,
    expense: &NewExpense,
) -> Result<Expense, StoreError> {
    let cents = checked_cents(expense)?;
    let row = sqlx::query_as::<_, ExpenseRow>(concat!(
        "UPDATE expenses SET date = ?, category = ?, description = ?, amount_cents = ?, ",
        "vendor = ?, payment_method = ?, updated_at = datetime('now') ",
        "WHERE id = ? RETURNING ",
        expense_columns!()
    ))
    .bind(expense.date.format("%Y-%m-%d").to_string())
    .bind(&expense.category)
    .bind(&expense.description)
    .bind(cents)
    .bind(&expense.vendor)
    .bind(&expense.payment_method)
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => expense_from_row(row),
        None => Err(StoreError::ExpenseNotFound(id.0)),
    }
}

pub async fn delete_expense(pool: &DbPool, id: ExpenseId) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::ExpenseNotFound(id.0));
    }
    Ok(())
}
