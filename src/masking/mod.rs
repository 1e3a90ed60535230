//! Masking catalog and recommender
//!
//! The catalog is a closed set of transformation kinds ([`Transformer`])
//! plus immutable priority tables mapping a column's property triple to an
//! ordered list of applicable transformations. Constructed once and passed
//! by reference; never mutated afterwards.

pub mod options;
pub mod transforms;

use crate::domain::{ColumnType, InformationType, SensitivityType};
use serde::{Deserialize, Serialize};

pub use options::MaskingOptions;

/// A column transformation kind.
///
/// The set is closed: unknown names fail at the boundary
/// ([`Transformer::from_name`]) instead of deep inside a runtime lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transformer {
    Retain,
    Shuffle,
    Suppress,
    FullMasking,
    /// One-way SHA-256 digest of the canonical value form.
    ///
    /// Deterministic and unsalted: equal inputs yield equal digests, which
    /// permits linkage via digest matching across releases. Kept for output
    /// compatibility.
    Pseudonymize,
    MaskNric,
    MaskEmail,
    GeneraliseNumBin,
    GeneraliseNumBinMean,
    GeneraliseDateBin,
    GeneraliseDateBinMedian,
    Encode,
    Transpose,
}

impl Transformer {
    /// Display name, also the boundary string for selection
    pub fn name(&self) -> &'static str {
        match self {
            Self::Retain => "Retain",
            Self::Shuffle => "Shuffle",
            Self::Suppress => "Suppress",
            Self::FullMasking => "Full Masking",
            Self::Pseudonymize => "Pseudonymize",
            Self::MaskNric => "Mask NRIC",
            Self::MaskEmail => "Mask Email",
            Self::GeneraliseNumBin => "Generalise (Numerical Bin)",
            Self::GeneraliseNumBinMean => "Generalise (Numerical Bin Mean)",
            Self::GeneraliseDateBin => "Generalise (Date Bin)",
            Self::GeneraliseDateBinMedian => "Generalise (Date Bin Median)",
            Self::Encode => "Encode",
            Self::Transpose => "Transpose",
        }
    }

    /// Parse a display name back into a transformer
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.name() == name)
    }

    /// Every transformer in the catalog
    pub fn all() -> &'static [Self] {
        &[
            Self::Retain,
            Self::Shuffle,
            Self::Suppress,
            Self::FullMasking,
            Self::Pseudonymize,
            Self::MaskNric,
            Self::MaskEmail,
            Self::GeneraliseNumBin,
            Self::GeneraliseNumBinMean,
            Self::GeneraliseDateBin,
            Self::GeneraliseDateBinMedian,
            Self::Encode,
            Self::Transpose,
        ]
    }
}

impl std::fmt::Display for Transformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Transformations applicable to every column, in fallback order
const GENERAL_TRANSFORMERS: [Transformer; 6] = [
    Transformer::Retain,
    Transformer::Suppress,
    Transformer::Pseudonymize,
    Transformer::FullMasking,
    Transformer::Transpose,
    Transformer::Shuffle,
];

/// Immutable priority tables mapping property triples to transformations
#[derive(Debug, Default)]
pub struct MaskingCatalog;

impl MaskingCatalog {
    /// Create the catalog
    pub fn new() -> Self {
        Self
    }

    /// Priority list for an information type (may be empty: fall through)
    fn information_priority(info: InformationType) -> &'static [Transformer] {
        match info {
            InformationType::Nric => &[Transformer::MaskNric],
            InformationType::Email => &[Transformer::MaskEmail],
            InformationType::PhoneNumber => &[Transformer::Pseudonymize, Transformer::Suppress],
            InformationType::Salary | InformationType::DateOfBirth | InformationType::Others => &[],
        }
    }

    /// Priority list for a sensitivity type (may be empty: fall through)
    fn sensitivity_priority(sensitivity: SensitivityType) -> &'static [Transformer] {
        match sensitivity {
            SensitivityType::DirectIdentifier => &[
                Transformer::Pseudonymize,
                Transformer::Suppress,
                Transformer::FullMasking,
            ],
            SensitivityType::IndirectIdentifier | SensitivityType::Sensitive => &[],
            SensitivityType::NonSensitive => &[Transformer::Retain],
        }
    }

    /// Priority list for a column type
    fn column_priority(column_type: ColumnType) -> &'static [Transformer] {
        match column_type {
            ColumnType::Categorical => &[Transformer::Encode],
            ColumnType::Continuous => &[
                Transformer::GeneraliseNumBinMean,
                Transformer::GeneraliseNumBin,
            ],
            ColumnType::Datetime => &[
                Transformer::GeneraliseDateBinMedian,
                Transformer::GeneraliseDateBin,
            ],
            ColumnType::UniqueSparse => &[Transformer::Pseudonymize],
            ColumnType::Others => &[Transformer::Retain],
        }
    }

    /// Ordered list of applicable transformations for a property triple.
    ///
    /// Concatenates the information-type and sensitivity-type lists, then
    /// (unless the column is a direct identifier) the column-type list and
    /// the general fallbacks, deduplicated on first occurrence. The first
    /// element is the recommended default.
    ///
    /// Direct identifiers return early: their sensitivity-driven list is
    /// exhaustive, so a weaker column-type or general transform is never
    /// recommended for them.
    pub fn recommend(
        &self,
        info: InformationType,
        sensitivity: SensitivityType,
        column_type: ColumnType,
    ) -> Vec<Transformer> {
        let mut result: Vec<Transformer> = Vec::new();

        let mut push_all = |result: &mut Vec<Transformer>, transformers: &[Transformer]| {
            for transformer in transformers {
                if !result.contains(transformer) {
                    result.push(*transformer);
                }
            }
        };

        push_all(&mut result, Self::information_priority(info));
        push_all(&mut result, Self::sensitivity_priority(sensitivity));

        if sensitivity == SensitivityType::DirectIdentifier {
            return result;
        }

        push_all(&mut result, Self::column_priority(column_type));
        push_all(&mut result, &GENERAL_TRANSFORMERS);

        result
    }
}

/// Ordered mapping from column name to its selected transformation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerTable {
    entries: Vec<(String, Transformer)>,
}

impl TransformerTable {
    pub(crate) fn new(entries: Vec<(String, Transformer)>) -> Self {
        Self { entries }
    }

    /// Selected transformation for a column
    pub fn get(&self, column: &str) -> Option<Transformer> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, t)| *t)
    }

    pub(crate) fn set(&mut self, column: &str, transformer: Transformer) {
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| name == column) {
            entry.1 = transformer;
        }
    }

    /// Iterator over `(column, transformer)` in dataset order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Transformer)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), *t))
    }

    /// Number of columns tracked
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no columns are tracked
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
