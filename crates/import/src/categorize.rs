use outlay_core::{CategoryRule, FALLBACK_CATEGORY};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// The rule snapshot could not be read.
#[derive(Debug, Clone, Error)]
#[error("category rules unavailable: {0}")]
pub struct RuleSourceError(pub String);

/// Anything that can hand out the current set of category rules.
pub trait CategoryRuleProvider {
    fn ordered_rules(&self) -> Result<Vec<CategoryRule>, RuleSourceError>;
}

impl CategoryRuleProvider for [CategoryRule] {
    fn ordered_rules(&self) -> Result<Vec<CategoryRule>, RuleSourceError> {
        Ok(self.to_vec())
    }
}

impl CategoryRuleProvider for Vec<CategoryRule> {
    fn ordered_rules(&self) -> Result<Vec<CategoryRule>, RuleSourceError> {
        Ok(self.clone())
    }
}

/// A finished rule lookup, e.g. from an async store, that may have failed.
impl<E: fmt::Display> CategoryRuleProvider for Result<Vec<CategoryRule>, E> {
    fn ordered_rules(&self) -> Result<Vec<CategoryRule>, RuleSourceError> {
        match self {
            Ok(rules) => Ok(rules.clone()),
            Err(e) => Err(RuleSourceError(e.to_string())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<CategoryRule>,
}

/// Rule with its needle pre-folded for case-insensitive comparison.
#[derive(Debug, Clone)]
struct PreparedRule {
    rule: CategoryRule,
    needle: String,
}

impl PreparedRule {
    fn new(rule: CategoryRule) -> Self {
        let needle = if rule.case_sensitive {
            rule.keyword.clone()
        } else {
            rule.keyword.to_uppercase()
        };
        PreparedRule { rule, needle }
    }
}

/// Maps descriptions to categories using a fixed rule snapshot. Rules are
/// tried by `(category, keyword)` and the first containing match wins.
#[derive(Debug, Clone, Default)]
pub struct Categorizer {
    rules: Vec<PreparedRule>,
}

impl Categorizer {
    pub fn new(mut rules: Vec<CategoryRule>) -> Self {
        rules.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        Self {
            rules: rules.into_iter().map(PreparedRule::new).collect(),
        }
    }

    /// Never fails: an unreadable rule source leaves every description in
    /// the fallback category.
    pub fn from_provider<P: CategoryRuleProvider + ?Sized>(provider: &P) -> Self {
        match provider.ordered_rules() {
            Ok(rules) => Self::new(rules),
            Err(e) => {
                tracing::warn!(error = %e, "Categorizing without rules");
                Self::default()
            }
        }
    }

    /// Reads rules from a TOML document of `[[rules]]` tables.
    pub fn from_toml(toml_content: &str) -> Result<Self, toml::de::Error> {
        let file: RuleFile = toml::from_str(toml_content)?;
        Ok(Self::new(file.rules))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.rules.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in the order they are tried.
    #[cfg(test)]
    pub(crate) fn rules(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter().map(|pr| &pr.rule)
    }

    pub fn find_matching_rule(&self, description: &str) -> Option<&CategoryRule> {
        let folded = description.to_uppercase();
        self.rules
            .iter()
            .find(|pr| {
                if pr.rule.case_sensitive {
                    description.contains(&pr.needle)
                } else {
                    folded.contains(&pr.needle)
                }
            })
            .map(|pr| &pr.rule)
    }

    pub fn categorize(&self, description: &str) -> &str {
        self.find_matching_rule(description)
            .map_or(FALLBACK_CATEGORY, |rule| rule.category.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(category: &str, keyword: &str, case_sensitive: bool) -> CategoryRule {
        CategoryRule::new(category, keyword, case_sensitive)
    }

    #[test]
    fn keyword_match_is_case_insensitive_by_default() {
        let c = Categorizer::new(vec![rule("Food & Dining", "COFFEE", false)]);
        assert_eq!(c.categorize("Blue Bottle Coffee"), "Food & Dining");
    }

    #[test]
    fn unmatched_description_falls_back_to_other() {
        let c = Categorizer::new(vec![rule("Food & Dining", "COFFEE", false)]);
        assert_eq!(c.categorize("Hardware store"), "Other");
    }

    #[test]
    fn empty_rule_set_falls_back_to_other() {
        assert_eq!(Categorizer::default().categorize("anything"), FALLBACK_CATEGORY);
    }

    #[test]
    fn case_sensitive_rule_requires_exact_case() {
        let c = Categorizer::new(vec![rule("Travel", "Uber", true)]);
        assert_eq!(c.categorize("Uber trip downtown"), "Travel");
        assert_eq!(c.categorize("UBER TRIP"), "Other");
    }

    #[test]
    fn lowercase_keyword_matches_when_insensitive() {
        let c = Categorizer::new(vec![rule("Shopping", "mart", false)]);
        assert_eq!(c.categorize("WALMART SUPERCENTER"), "Shopping");
    }

    #[test]
    fn first_rule_in_category_keyword_order_wins() {
        // Supplied out of order; "Food & Dining" sorts before "Shopping".
        let c = Categorizer::new(vec![
            rule("Shopping", "MART", false),
            rule("Food & Dining", "FOOD", false),
        ]);
        assert_eq!(c.categorize("FOOD MART"), "Food & Dining");
    }

    #[test]
    fn keyword_order_breaks_ties_within_a_category() {
        let c = Categorizer::new(vec![
            rule("Transport", "TAXI", false),
            rule("Transport", "GRAB", false),
        ]);
        let first = c.find_matching_rule("GRAB TAXI").unwrap();
        assert_eq!(first.keyword, "GRAB");
    }

    #[test]
    fn ordering_is_independent_of_input_order() {
        let rules = vec![
            rule("Utilities", "GAS", false),
            rule("Transportation", "GAS STATION", false),
            rule("Healthcare", "CLINIC", false),
        ];
        let mut reversed = rules.clone();
        reversed.reverse();
        let a = Categorizer::new(rules);
        let b = Categorizer::new(reversed);
        let order_a: Vec<_> = a.rules().map(|r| r.keyword.clone()).collect();
        let order_b: Vec<_> = b.rules().map(|r| r.keyword.clone()).collect();
        assert_eq!(order_a, order_b);
        assert_eq!(a.categorize("SHELL GAS STATION"), "Transportation");
    }

    #[test]
    fn failed_provider_degrades_to_fallback() {
        let snapshot: Result<Vec<CategoryRule>, String> = Err("database is locked".to_string());
        let c = Categorizer::from_provider(&snapshot);
        assert!(c.is_empty());
        assert_eq!(c.categorize("Coffee"), "Other");
    }

    #[test]
    fn provider_snapshot_is_used_when_available() {
        let rules = vec![rule("Healthcare", "PHARMACY", false)];
        let c = Categorizer::from_provider(rules.as_slice());
        assert_eq!(c.len(), 1);
        assert_eq!(c.categorize("Guardian Pharmacy"), "Healthcare");
    }

    #[test]
    fn loads_rules_from_toml() {
        let c = Categorizer::from_toml(
            r#"
            [[rules]]
            category = "Travel"
            keyword = "AIRLINES"

            [[rules]]
            category = "Travel"
            keyword = "Hotel"
            case_sensitive = true
            "#,
        )
        .unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.categorize("Singapore Airlines"), "Travel");
        assert_eq!(c.categorize("HOTEL 81"), "Other");
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(Categorizer::from_toml("[[rules]]\ncategory = 3").is_err());
    }
}
