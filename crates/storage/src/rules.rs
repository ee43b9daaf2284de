use outlay_core::{CategoryRule, RuleId};
use sqlx::{QueryBuilder, Sqlite};

use crate::db::{parse_timestamp, DbPool, StoreError};

type RuleRow = (i64, String, String, bool, String, String);

macro_rules! rule_columns {
    () => {
        "id, category, keyword, case_sensitive, created_at, updated_at"
    };
}

fn rule_from_row(r: RuleRow) -> Result<CategoryRule, StoreError> {
    Ok(CategoryRule {
        id: Some(RuleId(r.0)),
        category: r.1,
        keyword: r.2,
        case_sensitive: r.3,
        created_at: Some(parse_timestamp(&r.4)?),
        updated_at: Some(parse_timestamp(&r.5)?),
    })
}

/// The full rule snapshot in matching order: `category`, then `keyword`.
pub async fn get_ordered_category_rules(pool: &DbPool) -> Result<Vec<CategoryRule>, StoreError> {
    list_category_rules(pool, None).await
}

pub async fn list_category_rules(
    pool: &DbPool,
    category: Option<&str>,
) -> Result<Vec<CategoryRule>, StoreError> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(concat!("SELECT ", rule_columns!(), " FROM categorization_rules"));
    if let Some(category) = category.filter(|c| !c.is_empty()) {
        qb.push(" WHERE category = ").push_bind(category.to_string());
    }
    qb.push(" ORDER BY category, keyword, id");

    let rows = qb.build_query_as::<RuleRow>().fetch_all(pool).await?;
    rows.into_iter().map(rule_from_row).collect()
}

pub async fn create_category_rule(
    pool: &DbPool,
    rule: &CategoryRule,
) -> Result<CategoryRule, StoreError> {
    rule.validate()?;
    let row = sqlx::query_as::<_, RuleRow>(concat!(
        "INSERT INTO categorization_rules (category, keyword, case_sensitive) VALUES (?, ?, ?) ",
        "RETURNING ",
        rule_columns!()
    ))
    .bind(rule.category.trim())
    .bind(rule.keyword.trim())
    .bind(rule.case_sensitive)
    .fetch_one(pool)
    .await?;

    rule_from_row(row)
}

pub async fn update_category_rule(
    pool: &DbPool,
    id: RuleId,
    rule: &CategoryRule,
) -> Result<CategoryRule, StoreError> {
    rule.validate()?;
    let row = sqlx::query_as::<_, RuleRow>(concat!(
        "UPDATE categorization_rules SET category = ?, keyword = ?, case_sensitive = ?, ",
        "updated_at = datetime('now') WHERE id = ? RETURNING ",
        rule_columns!()
    ))
    .bind(rule.category.trim())
    .bind(rule.keyword.trim())
    .bind(rule.case_sensitive)
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => rule_from_row(row),
        None => Err(StoreError::RuleNotFound(id.0)),
    }
}

pub async fn delete_category_rule(pool: &DbPool, id: RuleId) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM categorization_rules WHERE id = ?")
        .bind(id.0)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::RuleNotFound(id.0));
    }
    Ok(())
}

/// Distinct category names that have at least one rule, sorted.
pub async fn list_categories(pool: &DbPool) -> Result<Vec<String>, StoreError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT category FROM categorization_rules ORDER BY category")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(c,)| c).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_in_memory_db, seed_default_rules};
    use outlay_core::{RuleError, DEFAULT_RULES};

    #[tokio::test]
    async fn ordered_rules_sort_by_category_then_keyword() {
        let pool = create_in_memory_db().await.unwrap();
        for (category, keyword) in [("Shopping", "STORE"), ("Food", "TEA"), ("Food", "COFFEE")] {
            create_category_rule(&pool, &CategoryRule::new(category, keyword, false))
                .await
                .unwrap();
        }

        let rules = get_ordered_category_rules(&pool).await.unwrap();
        let pairs: Vec<_> = rules
            .iter()
            .map(|r| (r.category.as_str(), r.keyword.as_str()))
            .collect();
        assert_eq!(
            pairs,
            [("Food", "COFFEE"), ("Food", "TEA"), ("Shopping", "STORE")]
        );
        assert!(rules.iter().all(|r| r.id.is_some() && r.created_at.is_some()));
    }

    #[tokio::test]
    async fn create_trims_and_validates() {
        let pool = create_in_memory_db().await.unwrap();
        let created = create_category_rule(&pool, &CategoryRule::new(" Travel ", " Hotel ", true))
            .await
            .unwrap();
        assert_eq!(created.category, "Travel");
        assert_eq!(created.keyword, "Hotel");
        assert!(created.case_sensitive);

        assert!(matches!(
            create_category_rule(&pool, &CategoryRule::new("Travel", " ", false)).await,
            Err(StoreError::InvalidRule(RuleError::EmptyKeyword))
        ));
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let pool = create_in_memory_db().await.unwrap();
        seed_default_rules(&pool).await.unwrap();

        let health = list_category_rules(&pool, Some("Healthcare")).await.unwrap();
        let expected = DEFAULT_RULES
            .iter()
            .filter(|(c, _, _)| *c == "Healthcare")
            .count();
        assert_eq!(health.len(), expected);
        assert!(health.iter().all(|r| r.category == "Healthcare"));

        let all = list_category_rules(&pool, Some("")).await.unwrap();
        assert_eq!(all.len(), DEFAULT_RULES.len());
    }

    #[tokio::test]
    async fn update_and_delete_by_id() {
        let pool = create_in_memory_db().await.unwrap();
        let created = create_category_rule(&pool, &CategoryRule::new("Food", "CAFE", false))
            .await
            .unwrap();
        let id = created.id.unwrap();

        let updated = update_category_rule(&pool, id, &CategoryRule::new("Food", "Cafe", true))
            .await
            .unwrap();
        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.keyword, "Cafe");
        assert!(updated.case_sensitive);

        delete_category_rule(&pool, id).await.unwrap();
        assert!(matches!(
            delete_category_rule(&pool, id).await,
            Err(StoreError::RuleNotFound(_))
        ));
        assert!(matches!(
            update_category_rule(&pool, id, &CategoryRule::new("Food", "X", false)).await,
            Err(StoreError::RuleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn categories_are_distinct_and_sorted() {
        let pool = create_in_memory_db().await.unwrap();
        seed_default_rules(&pool).await.unwrap();
        let categories = list_categories(&pool).await.unwrap();
        assert_eq!(
            categories,
            ["Food & Dining", "Healthcare", "Shopping", "Transportation", "Utilities"]
        );
    }
}
