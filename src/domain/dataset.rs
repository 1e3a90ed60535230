//! In-memory tabular dataset model
//!
//! A [`Dataset`] is an ordered mapping from unique column name to a
//! [`Column`] of scalar [`Value`]s. All columns have equal length; duplicate
//! column names and ragged columns are rejected at construction time.

use crate::domain::errors::{Result, VeilError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A scalar cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// Boolean
    Bool(bool),
    /// UTF-8 text
    Text(String),
    /// Naive timestamp (no timezone)
    Timestamp(NaiveDateTime),
    /// Missing value
    Null,
}

impl Value {
    /// Canonical string form of the value.
    ///
    /// This is the stable representation used for pseudonymization digests,
    /// equivalence-class keys, and label-encoding order. `Null` canonicalizes
    /// to the empty string.
    pub fn canonical(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Text(s) => s.clone(),
            Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Null => String::new(),
        }
    }

    /// Returns the text content if this is a `Text` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns true for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Native type of a column
///
/// Inferred from the value variants at construction, except `Categorical`,
/// which is declare-only (the caller marks an enumerated column explicitly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Int,
    Float,
    Bool,
    Text,
    Timestamp,
    Categorical,
}

impl DType {
    /// Whether the type is numeric (`Int` or `Float`)
    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Int | DType::Float)
    }
}

/// An ordered sequence of scalar values with a native type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    dtype: DType,
    values: Vec<Value>,
}

impl Column {
    /// Create a column, inferring the native type from the values.
    ///
    /// Inference scans non-null values: a single shared variant yields that
    /// type, a mix of `Int` and `Float` yields `Float`, and any other mix
    /// (or an all-null column) falls back to `Text`.
    pub fn new(values: Vec<Value>) -> Self {
        let dtype = Self::infer_dtype(&values);
        Self { dtype, values }
    }

    /// Create a column declared as categorical/enumerated
    pub fn categorical(values: Vec<Value>) -> Self {
        Self {
            dtype: DType::Categorical,
            values,
        }
    }

    /// Create a column with an explicit native type
    pub fn with_dtype(dtype: DType, values: Vec<Value>) -> Self {
        Self { dtype, values }
    }

    fn infer_dtype(values: &[Value]) -> DType {
        let mut seen: Option<DType> = None;
        for value in values {
            let current = match value {
                Value::Int(_) => DType::Int,
                Value::Float(_) => DType::Float,
                Value::Bool(_) => DType::Bool,
                Value::Text(_) => DType::Text,
                Value::Timestamp(_) => DType::Timestamp,
                Value::Null => continue,
            };
            seen = match seen {
                None => Some(current),
                Some(prev) if prev == current => Some(prev),
                Some(DType::Int) if current == DType::Float => Some(DType::Float),
                Some(DType::Float) if current == DType::Int => Some(DType::Float),
                Some(_) => return DType::Text,
            };
        }
        seen.unwrap_or(DType::Text)
    }

    /// Native type of the column
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// The column's values, in row order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the column has no rows
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct values, by canonical form
    pub fn distinct_count(&self) -> usize {
        let mut seen = HashSet::new();
        for value in &self.values {
            seen.insert(value.canonical());
        }
        seen.len()
    }

    /// Iterator over non-null values
    pub fn non_null(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_null())
    }
}

/// An ordered mapping from unique column name to column
///
/// # Examples
///
/// ```
/// use veil::domain::{Column, Dataset, Value};
///
/// let dataset = Dataset::new(vec![
///     ("age".to_string(), Column::new(vec![Value::Int(25), Value::Int(32)])),
///     ("city".to_string(), Column::new(vec![
///         Value::Text("Bedok".to_string()),
///         Value::Text("Yishun".to_string()),
///     ])),
/// ])?;
///
/// assert_eq!(dataset.row_count(), 2);
/// assert_eq!(dataset.column_names(), vec!["age", "city"]);
/// # Ok::<(), veil::VeilError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<(String, Column)>,
}

impl Dataset {
    /// Create a dataset from named columns.
    ///
    /// # Errors
    ///
    /// Returns [`VeilError::DuplicateColumn`] if two columns share a name and
    /// [`VeilError::LengthMismatch`] if the columns are ragged.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self> {
        let mut seen = HashSet::new();
        for (name, _) in &columns {
            if !seen.insert(name.clone()) {
                return Err(VeilError::DuplicateColumn(name.clone()));
            }
        }

        if let Some((_, first)) = columns.first() {
            let expected = first.len();
            for (name, column) in &columns {
                if column.len() != expected {
                    return Err(VeilError::LengthMismatch {
                        column: name.clone(),
                        expected,
                        found: column.len(),
                    });
                }
            }
        }

        Ok(Self { columns })
    }

    /// Number of rows (0 for a dataset with no columns)
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names, in dataset order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// True if a column with this name exists
    pub fn contains_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Iterator over `(name, column)` pairs, in dataset order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }
}
