use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub i64);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuleError {
    #[error("Category is required")]
    EmptyCategory,
    #[error("Keyword is required")]
    EmptyKeyword,
}

/// A keyword rule: any description containing `keyword` is filed under
/// `category`. Stored rules carry an id and timestamps; rules built in
/// memory or read from a rule file leave them unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RuleId>,
    pub category: String,
    pub keyword: String,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CategoryRule {
    pub fn new(category: &str, keyword: &str, case_sensitive: bool) -> Self {
        CategoryRule {
            id: None,
            category: category.to_string(),
            keyword: keyword.to_string(),
            case_sensitive,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if self.category.trim().is_empty() {
            return Err(RuleError::EmptyCategory);
        }
        if self.keyword.trim().is_empty() {
            return Err(RuleError::EmptyKeyword);
        }
        Ok(())
    }
}

/// Rules seeded into an empty rule table: `(category, keyword, case_sensitive)`.
pub const DEFAULT_RULES: &[(&str, &str, bool)] = &[
    ("Transportation", "BUS", false),
    ("Transportation", "MRT", false),
    ("Transportation", "GRAB", false),
    ("Transportation", "TAXI", false),
    ("Transportation", "TRANSPORT", false),
    ("Food & Dining", "MCDONALDS", false),
    ("Food & Dining", "SUBWAY", false),
    ("Food & Dining", "COFFEE", false),
    ("Food & Dining", "RESTAURANT", false),
    ("Food & Dining", "CAFE", false),
    ("Food & Dining", "KITCHEN", false),
    ("Food & Dining", "SUSHI", false),
    ("Food & Dining", "RAMEN", false),
    ("Food & Dining", "DINING", false),
    ("Food & Dining", "FOOD", false),
    ("Food & Dining", "MEAL", false),
    ("Shopping", "SHOPPING", false),
    ("Shopping", "STORE", false),
    ("Shopping", "MART", false),
    ("Shopping", "RETAIL", false),
    ("Shopping", "PURCHASE", false),
    ("Utilities", "UTILITIES", false),
    ("Utilities", "ELECTRIC", false),
    ("Utilities", "WATER", false),
    ("Utilities", "GAS", false),
    ("Healthcare", "PHARMACY", false),
    ("Healthcare", "CLINIC", false),
    ("Healthcare", "HOSPITAL", false),
    ("Healthcare", "MEDICAL", false),
];

pub fn default_rules() -> Vec<CategoryRule> {
    DEFAULT_RULES
        .iter()
        .map(|(category, keyword, case_sensitive)| {
            CategoryRule::new(category, keyword, *case_sensitive)
        })
        .collect()
}
