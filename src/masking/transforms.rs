//! Transformation functions
//!
//! Each function maps a column of length N to a column of length N, row
//! order preserved. Null values pass through untouched; a value the
//! transformation cannot handle aborts the whole column with a
//! [`TransformError`] — no partial masking is produced.

use crate::domain::{Column, DType, TransformError, Value};
use crate::masking::{MaskingOptions, Transformer};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};

impl Transformer {
    /// Apply the transformation to a column.
    ///
    /// Row count and order are preserved for every kind. `Shuffle` reseeds
    /// from entropy on each invocation and is the only non-deterministic
    /// transformation.
    pub fn apply(
        &self,
        column: &Column,
        options: &MaskingOptions,
    ) -> Result<Column, TransformError> {
        match self {
            Self::Retain | Self::Transpose => Ok(column.clone()),
            Self::Shuffle => Ok(shuffle(column)),
            Self::Suppress => Ok(suppress(column, &options.suppress_sentinel)),
            Self::FullMasking => full_masking(column, options.mask_char),
            Self::Pseudonymize => Ok(pseudonymize(column)),
            Self::MaskNric => mask_nric(column, options.mask_char),
            Self::MaskEmail => mask_email(column, options.mask_char, options.email_retain_chars),
            Self::GeneraliseNumBin => generalise_num_bin(column, options),
            Self::GeneraliseNumBinMean => generalise_num_bin_mean(column, options),
            Self::GeneraliseDateBin => generalise_date_bin(column, options),
            Self::GeneraliseDateBinMedian => generalise_date_median(column, options),
            Self::Encode => Ok(encode(column)),
        }
    }
}

/// Uniformly random permutation; breaks row linkage, keeps the marginal
fn shuffle(column: &Column) -> Column {
    let mut values = column.values().to_vec();
    let mut rng = StdRng::from_entropy();
    values.shuffle(&mut rng);
    Column::with_dtype(column.dtype(), values)
}

/// Replace every value with the sentinel; signals presence without content
fn suppress(column: &Column, sentinel: &str) -> Column {
    let values = column
        .values()
        .iter()
        .map(|_| Value::Text(sentinel.to_string()))
        .collect();
    Column::with_dtype(DType::Text, values)
}

fn full_masking(column: &Column, mask_char: char) -> Result<Column, TransformError> {
    let values = column
        .values()
        .iter()
        .map(|value| match value {
            Value::Null => Ok(Value::Null),
            Value::Text(s) => Ok(Value::Text(
                std::iter::repeat(mask_char).take(s.chars().count()).collect(),
            )),
            other => Err(TransformError::UnsupportedType(format!(
                "full masking requires string values, found {other:?}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Column::with_dtype(DType::Text, values))
}

/// One-way SHA-256 digest of the canonical value form, hex encoded
fn pseudonymize(column: &Column) -> Column {
    let values = column
        .values()
        .iter()
        .map(|value| {
            if value.is_null() {
                return Value::Null;
            }
            let mut hasher = Sha256::new();
            hasher.update(value.canonical().as_bytes());
            let digest = hasher.finalize();
            Value::Text(format!("{digest:x}"))
        })
        .collect();

    Column::with_dtype(DType::Text, values)
}

/// Mask all but the last 4 characters of a structured identifier
fn mask_nric(column: &Column, mask_char: char) -> Result<Column, TransformError> {
    let values = column
        .values()
        .iter()
        .map(|value| match value {
            Value::Null => Ok(Value::Null),
            Value::Text(s) => {
                let chars: Vec<char> = s.chars().collect();
                if chars.len() < 4 {
                    return Err(TransformError::Format(format!(
                        "value of length {} is shorter than 4 characters",
                        chars.len()
                    )));
                }
                let masked: String = std::iter::repeat(mask_char)
                    .take(chars.len() - 4)
                    .chain(chars[chars.len() - 4..].iter().copied())
                    .collect();
                Ok(Value::Text(masked))
            }
            other => Err(TransformError::UnsupportedType(format!(
                "NRIC masking requires string values, found {other:?}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Column::with_dtype(DType::Text, values))
}

/// Mask the local part of an email beyond the retained prefix
fn mask_email(
    column: &Column,
    mask_char: char,
    retain_chars: usize,
) -> Result<Column, TransformError> {
    let values = column
        .values()
        .iter()
        .map(|value| match value {
            Value::Null => Ok(Value::Null),
            Value::Text(s) => {
                let parts: Vec<&str> = s.split('@').collect();
                if parts.len() != 2 {
                    return Err(TransformError::Format(
                        "value must contain exactly one '@'".to_string(),
                    ));
                }
                let local: Vec<char> = parts[0].chars().collect();
                let keep = retain_chars.min(local.len());
                let masked_local: String = local[..keep]
                    .iter()
                    .copied()
                    .chain(std::iter::repeat(mask_char).take(local.len() - keep))
                    .collect();
                Ok(Value::Text(format!("{}@{}", masked_local, parts[1])))
            }
            other => Err(TransformError::UnsupportedType(format!(
                "email masking requires string values, found {other:?}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Column::with_dtype(DType::Text, values))
}

/// Equal-width bin assignment over the column's numeric range.
///
/// Returns the per-row bin index (None for nulls) and the bin edges. The
/// lowest edge is stretched slightly below the minimum so the minimum falls
/// inside bin 0 of the left-open intervals.
fn numeric_bins(
    column: &Column,
    bins: usize,
) -> Result<(Vec<Option<usize>>, Vec<f64>), TransformError> {
    let mut numeric: Vec<Option<f64>> = Vec::with_capacity(column.len());
    for value in column.values() {
        match value {
            Value::Null => numeric.push(None),
            other => match other.as_f64() {
                Some(n) => numeric.push(Some(n)),
                None => {
                    return Err(TransformError::UnsupportedType(format!(
                        "numeric generalization requires numeric values, found {other:?}"
                    )))
                }
            },
        }
    }

    let present: Vec<f64> = numeric.iter().flatten().copied().collect();
    if present.is_empty() {
        return Ok((numeric.iter().map(|_| None).collect(), Vec::new()));
    }

    let mut lo = present.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        // Degenerate range: widen it the way pandas does
        let adjust = if lo == 0.0 { 0.001 } else { lo.abs() * 0.001 };
        lo -= adjust;
        hi += adjust;
    }
    let width = (hi - lo) / bins as f64;

    let indexes = numeric
        .iter()
        .map(|n| {
            n.map(|v| {
                let index = ((v - lo) / width).floor() as usize;
                index.min(bins - 1)
            })
        })
        .collect();

    let mut edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();
    edges[0] -= (hi - lo) * 0.001;

    Ok((indexes, edges))
}

/// Decimal places for interval display: whole for integers, 3 for floats
fn numeric_precision(column: &Column) -> usize {
    if column.dtype() == DType::Int {
        0
    } else {
        3
    }
}

fn generalise_num_bin(column: &Column, options: &MaskingOptions) -> Result<Column, TransformError> {
    let (indexes, edges) = numeric_bins(column, options.bins)?;
    let precision = numeric_precision(column);

    let values = indexes
        .iter()
        .map(|index| match index {
            None => Value::Null,
            Some(i) => Value::Text(format!(
                "({:.precision$}, {:.precision$}]",
                edges[*i],
                edges[*i + 1],
            )),
        })
        .collect();

    Ok(Column::with_dtype(DType::Text, values))
}

fn generalise_num_bin_mean(
    column: &Column,
    options: &MaskingOptions,
) -> Result<Column, TransformError> {
    let (indexes, edges) = numeric_bins(column, options.bins)?;
    let integral = column.dtype() == DType::Int;

    let values = indexes
        .iter()
        .map(|index| match index {
            None => Value::Null,
            Some(i) => {
                let midpoint = (edges[*i] + edges[*i + 1]) / 2.0;
                if integral {
                    Value::Int(midpoint.round() as i64)
                } else {
                    Value::Float(midpoint)
                }
            }
        })
        .collect();

    let dtype = if integral { DType::Int } else { DType::Float };
    Ok(Column::with_dtype(dtype, values))
}

/// Parse every value as a datetime (None for nulls)
fn parse_dates(
    column: &Column,
    formats: &[String],
) -> Result<Vec<Option<NaiveDateTime>>, TransformError> {
    column
        .values()
        .iter()
        .map(|value| match value {
            Value::Null => Ok(None),
            Value::Timestamp(ts) => Ok(Some(*ts)),
            Value::Text(s) => parse_date_text(s, formats).map(Some).ok_or_else(|| {
                TransformError::Format(format!("value '{s}' does not parse as a date"))
            }),
            other => Err(TransformError::UnsupportedType(format!(
                "date generalization requires date values, found {other:?}"
            ))),
        })
        .collect()
}

fn parse_date_text(text: &str, formats: &[String]) -> Option<NaiveDateTime> {
    for format in formats {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts);
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Equal-width date bins with bounds normalized to whole days.
///
/// Returns per-row bin index (None for nulls) and the normalized
/// `(left, right)` bound pair per bin.
#[allow(clippy::type_complexity)]
fn date_bins(
    column: &Column,
    options: &MaskingOptions,
) -> Result<(Vec<Option<usize>>, Vec<(NaiveDateTime, NaiveDateTime)>), TransformError> {
    let parsed = parse_dates(column, &options.date_formats)?;

    let present: Vec<i64> = parsed
        .iter()
        .flatten()
        .map(|ts| ts.and_utc().timestamp())
        .collect();
    if present.is_empty() {
        return Ok((parsed.iter().map(|_| None).collect(), Vec::new()));
    }

    let mut lo = *present.iter().min().unwrap_or(&0) as f64;
    let mut hi = *present.iter().max().unwrap_or(&0) as f64;
    if lo == hi {
        // Degenerate range: half a day each side
        lo -= 43_200.0;
        hi += 43_200.0;
    }
    let bins = options.bins;
    let width = (hi - lo) / bins as f64;

    let indexes = parsed
        .iter()
        .map(|ts| {
            ts.map(|ts| {
                let v = ts.and_utc().timestamp() as f64;
                let index = ((v - lo) / width).floor() as usize;
                index.min(bins - 1)
            })
        })
        .collect();

    let mut bounds = Vec::with_capacity(bins);
    for i in 0..bins {
        let left = normalize_day(lo + i as f64 * width)?;
        let right = normalize_day(lo + (i + 1) as f64 * width)?;
        bounds.push((left, right));
    }

    Ok((indexes, bounds))
}

/// Truncate an epoch-seconds edge to midnight of its day
fn normalize_day(epoch_seconds: f64) -> Result<NaiveDateTime, TransformError> {
    let ts = chrono::DateTime::from_timestamp(epoch_seconds as i64, 0)
        .ok_or_else(|| TransformError::Format("date bin edge out of range".to_string()))?
        .naive_utc();
    ts.date()
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| TransformError::Format("date bin edge out of range".to_string()))
}

fn generalise_date_bin(
    column: &Column,
    options: &MaskingOptions,
) -> Result<Column, TransformError> {
    let (indexes, bounds) = date_bins(column, options)?;

    let values = indexes
        .iter()
        .map(|index| match index {
            None => Value::Null,
            Some(i) => {
                let (left, right) = bounds[*i];
                Value::Text(format!(
                    "({}, {}]",
                    left.format("%Y-%m-%d"),
                    right.format("%Y-%m-%d"),
                ))
            }
        })
        .collect();

    Ok(Column::with_dtype(DType::Text, values))
}

fn generalise_date_median(
    column: &Column,
    options: &MaskingOptions,
) -> Result<Column, TransformError> {
    let (indexes, bounds) = date_bins(column, options)?;

    let values = indexes
        .iter()
        .map(|index| match index {
            None => Value::Null,
            Some(i) => {
                let (left, right) = bounds[*i];
                let half = Duration::seconds((right - left).num_seconds() / 2);
                Value::Timestamp(left + half)
            }
        })
        .collect();

    Ok(Column::with_dtype(DType::Timestamp, values))
}

/// Label encoding: distinct canonical values, sorted, mapped to 0..k.
///
/// The code assignment is local to the invocation; repeated calls over
/// different inputs need not agree.
fn encode(column: &Column) -> Column {
    let distinct: BTreeSet<String> = column.non_null().map(|v| v.canonical()).collect();
    let mapping: HashMap<String, i64> = distinct.into_iter().zip(0..).collect();

    let values = column
        .values()
        .iter()
        .map(|value| {
            if value.is_null() {
                return Value::Null;
            }
            mapping
                .get(&value.canonical())
                .copied()
                .map(Value::Int)
                .unwrap_or(Value::Null)
        })
        .collect();

    Column::with_dtype(DType::Int, values)
}
