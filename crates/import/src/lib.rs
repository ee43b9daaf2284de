pub mod categorize;
pub mod csv;
pub mod normalize;

pub use crate::categorize::{Categorizer, CategoryRuleProvider, RuleSourceError};
pub use crate::csv::{
    check_upload, parse_csv, HeaderMap, ImportError, ParsedImport, RowError, RowErrorKind,
    MAX_UPLOAD_BYTES, REQUIRED_COLUMNS,
};

pub mod import {
    use crate::*;

    /// Checks an upload and parses it against a rule snapshot taken once for
    /// the whole file.
    pub fn preview_csv<R, P>(
        data: R,
        filename: &str,
        size: usize,
        limit: usize,
        rules: &P,
    ) -> Result<ParsedImport, ImportError>
    where
        R: std::io::Read,
        P: CategoryRuleProvider + ?Sized,
    {
        check_upload(filename, size, limit)?;
        let categorizer = Categorizer::from_provider(rules);
        parse_csv(data, &categorizer)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use outlay_core::CategoryRule;

        #[test]
        fn preview_rejects_non_csv_before_reading() {
            let rules: Vec<CategoryRule> = Vec::new();
            let result = preview_csv(&b"garbage"[..], "photo.png", 7, MAX_UPLOAD_BYTES, &rules);
            assert!(matches!(result, Err(ImportError::NotCsv(_))));
        }

        #[test]
        fn preview_categorizes_with_snapshot() {
            let rules = vec![CategoryRule::new("Food & Dining", "COFFEE", false)];
            let data = b"TRANSACTION_DATE,DESCRIPTION,AMOUNT\n2024-01-15,Blue Bottle Coffee,4.50\n";
            let parsed = preview_csv(&data[..], "jan.csv", data.len(), MAX_UPLOAD_BYTES, &rules).unwrap();
            assert_eq!(parsed.expenses[0].category, "Food & Dining");
        }

        #[test]
        fn preview_enforces_caller_limit() {
            let rules: Vec<CategoryRule> = Vec::new();
            let data = b"TRANSACTION_DATE,DESCRIPTION,AMOUNT\n";
            let result = preview_csv(&data[..], "big.csv", 2048, 1024, &rules);
            assert!(matches!(
                result,
                Err(ImportError::TooLarge { size: 2048, limit: 1024 })
            ));
        }
    }
}
