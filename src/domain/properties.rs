//! Column property model
//!
//! Every dataset column carries exactly one [`ColumnProperties`] triple:
//! a [`ColumnType`], an [`InformationType`], and a [`SensitivityType`].
//! Defaults are assigned by the classifier and may be overridden through the
//! anonymization engine.

use serde::{Deserialize, Serialize};

/// Structural type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Continuous,
    Categorical,
    Datetime,
    UniqueSparse,
    Others,
}

impl ColumnType {
    /// Human-readable label, also the approved boundary string
    pub fn label(&self) -> &'static str {
        match self {
            Self::Continuous => "Continuous",
            Self::Categorical => "Categorical",
            Self::Datetime => "Datetime",
            Self::UniqueSparse => "Unique/Sparse",
            Self::Others => "Others",
        }
    }

    /// Parse an approved label back into the type
    pub fn from_label(label: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.label() == label)
    }

    /// The approved set of column types
    pub fn variants() -> &'static [Self] {
        &[
            Self::Continuous,
            Self::Categorical,
            Self::Datetime,
            Self::UniqueSparse,
            Self::Others,
        ]
    }
}

/// Semantic content of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InformationType {
    Nric,
    Email,
    PhoneNumber,
    Salary,
    DateOfBirth,
    Others,
}

impl InformationType {
    /// Human-readable label, also the approved boundary string
    pub fn label(&self) -> &'static str {
        match self {
            Self::Nric => "NRIC",
            Self::Email => "Email",
            Self::PhoneNumber => "Phone Number",
            Self::Salary => "Salary",
            Self::DateOfBirth => "Date of Birth",
            Self::Others => "Others",
        }
    }

    /// Parse an approved label back into the type
    pub fn from_label(label: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.label() == label)
    }

    /// The approved set of information types
    pub fn variants() -> &'static [Self] {
        &[
            Self::Nric,
            Self::Email,
            Self::PhoneNumber,
            Self::Salary,
            Self::DateOfBirth,
            Self::Others,
        ]
    }
}

/// Privacy sensitivity of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityType {
    DirectIdentifier,
    IndirectIdentifier,
    Sensitive,
    NonSensitive,
}

impl SensitivityType {
    /// Human-readable label, also the approved boundary string
    pub fn label(&self) -> &'static str {
        match self {
            Self::DirectIdentifier => "Direct Identifier",
            Self::IndirectIdentifier => "Indirect Identifier",
            Self::Sensitive => "Sensitive",
            Self::NonSensitive => "Non-Sensitive",
        }
    }

    /// Parse an approved label back into the type
    pub fn from_label(label: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|v| v.label() == label)
    }

    /// The approved set of sensitivity types
    pub fn variants() -> &'static [Self] {
        &[
            Self::DirectIdentifier,
            Self::IndirectIdentifier,
            Self::Sensitive,
            Self::NonSensitive,
        ]
    }
}

/// Selector for one of the three property categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    ColumnType,
    InformationType,
    SensitivityType,
}

impl PropertyKind {
    /// Boundary name of the selector
    pub fn label(&self) -> &'static str {
        match self {
            Self::ColumnType => "column_type",
            Self::InformationType => "information_type",
            Self::SensitivityType => "sensitivity_type",
        }
    }

    /// The approved labels for this property category
    pub fn approved_labels(&self) -> Vec<&'static str> {
        match self {
            Self::ColumnType => ColumnType::variants().iter().map(|v| v.label()).collect(),
            Self::InformationType => InformationType::variants()
                .iter()
                .map(|v| v.label())
                .collect(),
            Self::SensitivityType => SensitivityType::variants()
                .iter()
                .map(|v| v.label())
                .collect(),
        }
    }
}

/// The property triple assigned to a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnProperties {
    pub column_type: ColumnType,
    pub information_type: InformationType,
    pub sensitivity_type: SensitivityType,
}

/// Ordered mapping from column name to its property triple
///
/// Created once per dataset by the classifier; mutated only through explicit
/// overrides; never loses a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyTable {
    entries: Vec<(String, ColumnProperties)>,
}

impl PropertyTable {
    pub(crate) fn new(entries: Vec<(String, ColumnProperties)>) -> Self {
        Self { entries }
    }

    /// Properties for a column
    pub fn get(&self, column: &str) -> Option<&ColumnProperties> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, p)| p)
    }

    pub(crate) fn get_mut(&mut self, column: &str) -> Option<&mut ColumnProperties> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == column)
            .map(|(_, p)| p)
    }

    /// Iterator over `(column, properties)` in dataset order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnProperties)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p))
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
