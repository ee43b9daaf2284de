pub mod db;
pub mod expenses;
pub mod rules;

pub use db::{create_db, create_in_memory_db, seed_default_rules, DbPool, StoreError};
pub use expenses::{
    bulk_insert_expenses, delete_expense, get_expense, insert_expense, list_expenses,
    update_expense,
};
pub use rules::{
    create_category_rule, delete_category_rule, get_ordered_category_rules, list_categories,
    list_category_rules, update_category_rule,
};
