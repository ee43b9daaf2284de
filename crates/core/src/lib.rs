pub mod category;
pub mod expense;
pub mod money;

pub use category::{default_rules, CategoryRule, RuleError, RuleId, DEFAULT_RULES};
pub use expense::{
    Expense, ExpenseError, ExpenseFilter, ExpenseId, NewExpense, CSV_PAYMENT_METHOD,
    FALLBACK_CATEGORY,
};
pub use money::Money;
