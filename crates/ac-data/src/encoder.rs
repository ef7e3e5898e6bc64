//! Column encoding: categorical and text feature columns become integer codes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use ac_types::{Column, ColumnValues, Dataset};

/// Which columns an encoding pass touched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingReport {
    /// Columns replaced by integer codes.
    pub encoded: Vec<String>,
    /// Columns passed through unchanged (numeric columns and the target).
    pub passthrough: Vec<String>,
}

/// Replaces every non-target categorical/text column with integer codes.
///
/// Codes index the sorted distinct values of the column; missing cells get
/// -1. The mapping is local to one pass.
#[derive(Debug, Clone, Default)]
pub struct ColumnEncoder;

impl ColumnEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, dataset: &Dataset, target: &str) -> (Dataset, EncodingReport) {
        let mut report = EncodingReport::default();

        let columns: Vec<Column> = dataset
            .columns()
            .iter()
            .map(|column| {
                if column.name == target {
                    tracing::debug!(column = %column.name, "target column left as-is");
                    report.passthrough.push(column.name.clone());
                    return column.clone();
                }
                match &column.values {
                    ColumnValues::Numeric(_) => {
                        report.passthrough.push(column.name.clone());
                        column.clone()
                    }
                    ColumnValues::Categorical(values) | ColumnValues::Text(values) => {
                        report.encoded.push(column.name.clone());
                        Column::numeric(column.name.clone(), category_codes(values))
                    }
                }
            })
            .collect();

        tracing::info!(
            encoded = report.encoded.len(),
            passthrough = report.passthrough.len(),
            "Encoded dataset columns"
        );

        // Same names and lengths as the input, so this cannot fail.
        let encoded = Dataset::new(columns).unwrap_or_else(|_| dataset.clone());
        (encoded, report)
    }
}

fn category_codes(values: &[Option<String>]) -> Vec<f64> {
    let categories: Vec<&str> = values
        .iter()
        .flatten()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    values
        .iter()
        .map(|value| match value {
            Some(v) => categories
                .binary_search(&v.as_str())
                .map(|code| code as f64)
                .unwrap_or(-1.0),
            None => -1.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_types::ColumnKind;
    use proptest::prelude::*;

    fn mixed_dataset() -> Dataset {
        Dataset::new(vec![
            Column::numeric("income", vec![10.0, 20.0, 30.0, 40.0]),
            Column::text(
                "city",
                vec![
                    Some("paris".into()),
                    Some("berlin".into()),
                    None,
                    Some("paris".into()),
                ],
            ),
            Column::categorical(
                "tier",
                vec![Some("b".into()), Some("a".into()), Some("b".into()), Some("c".into())],
            ),
            Column::from_strings("target", &["yes", "no", "yes", "no"]),
        ])
        .unwrap()
    }

    #[test]
    fn encodes_text_and_categorical_with_sorted_codes() {
        let (encoded, report) = ColumnEncoder::new().encode(&mixed_dataset(), "target");

        assert_eq!(report.encoded, vec!["city", "tier"]);
        assert_eq!(report.passthrough, vec!["income", "target"]);

        let city = encoded.column("city").unwrap().as_numeric().unwrap();
        assert_eq!(city, &[1.0, 0.0, -1.0, 1.0]);
        let tier = encoded.column("tier").unwrap().as_numeric().unwrap();
        assert_eq!(tier, &[1.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn never_encodes_the_target() {
        let (encoded, _) = ColumnEncoder::new().encode(&mixed_dataset(), "target");
        let target = encoded.column("target").unwrap();
        assert_eq!(target.kind(), ColumnKind::Text);
        assert_eq!(target, mixed_dataset().column("target").unwrap());
    }

    #[test]
    fn preserves_column_order_and_length() {
        let original = mixed_dataset();
        let (encoded, _) = ColumnEncoder::new().encode(&original, "target");
        assert_eq!(encoded.column_names(), original.column_names());
        assert_eq!(encoded.len(), original.len());
    }

    proptest! {
        #[test]
        fn numeric_columns_are_idempotent(values in prop::collection::vec(-1e6f64..1e6, 1..40)) {
            let dataset = Dataset::new(vec![
                Column::numeric("x", values.clone()),
                Column::numeric("target", vec![0.0; values.len()]),
            ]).unwrap();

            let encoder = ColumnEncoder::new();
            let (once, _) = encoder.encode(&dataset, "target");
            let (twice, _) = encoder.encode(&once, "target");

            prop_assert_eq!(&once, &dataset);
            prop_assert_eq!(&twice, &once);
        }

        #[test]
        fn text_codes_stable_after_first_pass(labels in prop::collection::vec("[a-d]", 1..30)) {
            let dataset = Dataset::new(vec![
                Column::from_strings("label", &labels),
                Column::numeric("target", vec![1.0; labels.len()]),
            ]).unwrap();

            let encoder = ColumnEncoder::new();
            let (once, _) = encoder.encode(&dataset, "target");
            let (twice, report) = encoder.encode(&once, "target");

            prop_assert!(report.encoded.is_empty());
            prop_assert_eq!(twice, once);
        }
    }
}
