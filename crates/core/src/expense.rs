use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::money::Money;

/// Category assigned when no keyword rule matches.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Payment method recorded for imported rows without a `CREDIT_CARD` value.
pub const CSV_PAYMENT_METHOD: &str = "CSV Import";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(pub i64);

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExpenseError {
    #[error("Description must not be empty")]
    EmptyDescription,
    #[error("Category must not be empty")]
    EmptyCategory,
    #[error("Amount {0} is outside the allowed range")]
    AmountOutOfRange(Money),
}

/// An expense that has not been persisted yet: built by hand or produced
/// by a CSV import preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub date: NaiveDate,
    pub category: String,
    pub description: String,
    pub amount: Money,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub payment_method: String,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), ExpenseError> {
        if self.description.trim().is_empty() {
            return Err(ExpenseError::EmptyDescription);
        }
        if self.category.trim().is_empty() {
            return Err(ExpenseError::EmptyCategory);
        }
        if !self.amount.is_within_limits() {
            return Err(ExpenseError::AmountOutOfRange(self.amount));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub date: NaiveDate,
    pub category: String,
    pub description: String,
    pub amount: Money,
    pub vendor: Option<String>,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional constraints for listing stored expenses. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExpenseFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lunch() -> NewExpense {
        NewExpense {
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            category: "Food & Dining".to_string(),
            description: "Ramen Nagi".to_string(),
            amount: Money::from_cents(1850),
            vendor: None,
            payment_method: CSV_PAYMENT_METHOD.to_string(),
        }
    }

    #[test]
    fn validate_accepts_well_formed_expense() {
        assert_eq!(lunch().validate(), Ok(()));
    }

    #[test]
    fn validate_accepts_refund() {
        let refund = NewExpense {
            amount: Money::from_cents(-1850),
            ..lunch()
        };
        assert!(refund.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_description() {
        let e = NewExpense {
            description: "   ".to_string(),
            ..lunch()
        };
        assert_eq!(e.validate(), Err(ExpenseError::EmptyDescription));
    }

    #[test]
    fn validate_rejects_blank_category() {
        let e = NewExpense {
            category: String::new(),
            ..lunch()
        };
        assert_eq!(e.validate(), Err(ExpenseError::EmptyCategory));
    }

    #[test]
    fn validate_rejects_out_of_range_amount() {
        let e = NewExpense {
            amount: Money::from_cents(100_000_000),
            ..lunch()
        };
        assert!(matches!(e.validate(), Err(ExpenseError::AmountOutOfRange(_))));
    }

    #[test]
    fn json_shape_uses_iso_date_and_numeric_amount() {
        let json = serde_json::to_value(lunch()).unwrap();
        assert_eq!(json["date"], "2024-03-04");
        assert_eq!(json["amount"], 18.5);
        assert_eq!(json["payment_method"], "CSV Import");
        assert!(json["vendor"].is_null());
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let e: NewExpense = serde_json::from_str(
            r#"{"date":"2024-03-04","category":"Other","description":"Misc","amount":-3}"#,
        )
        .unwrap();
        assert_eq!(e.amount, Money::from_cents(-300));
        assert_eq!(e.vendor, None);
        assert_eq!(e.payment_method, "");
    }
}
