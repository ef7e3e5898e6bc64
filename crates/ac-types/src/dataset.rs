//! Tabular data model: columns, datasets, target values and feature matrices.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use crate::errors::{AcResult, DataError};

/// Declared kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    /// Raw text / object values of unknown semantics.
    Text,
}

/// Column storage. Missing numeric cells are NaN, missing text cells are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValues {
    Numeric(Vec<f64>),
    Categorical(Vec<Option<String>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Categorical(v) | Self::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named column of a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Categorical(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Text(values),
        }
    }

    /// Convenience constructor for text columns without missing cells.
    pub fn from_strings<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        Self::text(
            name,
            values.iter().map(|s| Some(s.as_ref().to_string())).collect(),
        )
    }

    pub fn kind(&self) -> ColumnKind {
        match self.values {
            ColumnValues::Numeric(_) => ColumnKind::Numeric,
            ColumnValues::Categorical(_) => ColumnKind::Categorical,
            ColumnValues::Text(_) => ColumnKind::Text,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == ColumnKind::Numeric
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.values {
            ColumnValues::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Number of distinct non-missing values.
    pub fn distinct_count(&self) -> usize {
        match &self.values {
            ColumnValues::Numeric(values) => values
                .iter()
                .filter(|v| !v.is_nan())
                // Fold -0.0 into 0.0 so both count once.
                .map(|v| (v + 0.0).to_bits())
                .collect::<HashSet<_>>()
                .len(),
            ColumnValues::Categorical(values) | ColumnValues::Text(values) => values
                .iter()
                .flatten()
                .collect::<HashSet<_>>()
                .len(),
        }
    }

    /// The column's values as target values, preserving their native form.
    pub fn target_values(&self) -> Vec<TargetValue> {
        match &self.values {
            ColumnValues::Numeric(values) => values
                .iter()
                .map(|&v| {
                    if v.is_nan() {
                        TargetValue::Missing
                    } else {
                        TargetValue::Number(v)
                    }
                })
                .collect(),
            ColumnValues::Categorical(values) | ColumnValues::Text(values) => values
                .iter()
                .map(|v| match v {
                    Some(s) => TargetValue::Label(s.clone()),
                    None => TargetValue::Missing,
                })
                .collect(),
        }
    }
}

/// A single target value in its native form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetValue {
    Number(f64),
    Label(String),
    Missing,
}

impl TargetValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Total order used to sort class labels: numbers, then labels, then missing.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Label(a), Self::Label(b)) => a.cmp(b),
            (Self::Number(_), _) => Ordering::Less,
            (_, Self::Number(_)) => Ordering::Greater,
            (Self::Label(_), Self::Missing) => Ordering::Less,
            (Self::Missing, Self::Label(_)) => Ordering::Greater,
            (Self::Missing, Self::Missing) => Ordering::Equal,
        }
    }
}

impl fmt::Display for TargetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Label(s) => write!(f, "{s}"),
            Self::Missing => write!(f, "<missing>"),
        }
    }
}

/// An ordered set of equal-length, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> AcResult<Self> {
        let mut seen = HashSet::new();
        let expected = columns.first().map(Column::len).unwrap_or(0);

        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DataError::DuplicateColumn {
                    column: column.name.clone(),
                }
                .into());
            }
            if column.len() != expected {
                return Err(DataError::LengthMismatch {
                    column: column.name.clone(),
                    expected,
                    actual: column.len(),
                }
                .into());
            }
        }

        Ok(Self { columns })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> AcResult<&Column> {
        self.column(name).ok_or_else(|| {
            DataError::ColumnNotFound {
                column: name.to_string(),
            }
            .into()
        })
    }

    /// Separate the target column from the features. Every other column
    /// must already be numeric.
    pub fn split_target(&self, target: &str) -> AcResult<(FeatureMatrix, Column)> {
        let target_column = self.require_column(target)?.clone();

        let mut names = Vec::new();
        let mut feature_columns = Vec::new();
        for column in self.columns.iter().filter(|c| c.name != target) {
            let values = column.as_numeric().ok_or_else(|| DataError::NonNumericFeature {
                column: column.name.clone(),
            })?;
            names.push(column.name.clone());
            feature_columns.push(values);
        }

        let rows = (0..self.len())
            .map(|i| feature_columns.iter().map(|col| col[i]).collect())
            .collect();

        Ok((FeatureMatrix::new(names, rows)?, target_column))
    }
}

/// Row-major numeric feature matrix with named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn new(names: Vec<String>, rows: Vec<Vec<f64>>) -> AcResult<Self> {
        for (row, values) in rows.iter().enumerate() {
            if values.len() != names.len() {
                return Err(DataError::RaggedRow {
                    row,
                    expected: names.len(),
                    actual: values.len(),
                }
                .into());
            }
        }
        Ok(Self { names, rows })
    }

    /// An empty matrix sharing this matrix's feature names.
    pub fn empty_like(&self) -> Self {
        Self {
            names: self.names.clone(),
            rows: Vec::new(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// Copy of the selected rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Build a matrix from raw rows with the same feature names.
    pub fn with_rows(&self, rows: Vec<Vec<f64>>) -> AcResult<Self> {
        Self::new(self.names.clone(), rows)
    }

    /// NaN marks a missing value and does not count.
    pub fn has_infinite(&self) -> bool {
        self.rows.iter().flatten().any(|v| v.is_infinite())
    }
}
