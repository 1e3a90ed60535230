//! Pattern library for property classification
//!
//! Holds the name lexicons, value regexes, and date formats the classifier
//! consults. Built once from TOML (embedded default or a caller-supplied
//! file) and passed by reference; never mutated after construction.

use crate::domain::{InformationType, SensitivityType};
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Date formats used when the pattern library omits a `[datetime]` section.
///
/// Also the default parse list for date generalization.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d %b %Y",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Value pattern set from TOML
#[derive(Debug, Deserialize)]
struct PatternSet {
    patterns: Vec<String>,
}

/// Value pattern sections from TOML
#[derive(Debug, Deserialize)]
struct ValueSection {
    nric: PatternSet,
    phone: PatternSet,
    email: PatternSet,
}

/// Lexicon sections from TOML
#[derive(Debug, Deserialize)]
struct LexiconSection {
    information: HashMap<String, String>,
    sensitivity: HashMap<String, String>,
}

/// Datetime section from TOML
#[derive(Debug, Deserialize)]
struct DatetimeSection {
    formats: Vec<String>,
}

/// Pattern library container
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    lexicon: LexiconSection,
    values: ValueSection,
    datetime: Option<DatetimeSection>,
}

/// Compiled pattern registry consulted by the classifier
pub struct PatternRegistry {
    information_lexicon: Vec<(String, InformationType)>,
    sensitivity_lexicon: Vec<(String, SensitivityType)>,
    nric_patterns: Vec<Regex>,
    phone_patterns: Vec<Regex>,
    email_patterns: Vec<Regex>,
    date_formats: Vec<String>,
}

impl PatternRegistry {
    /// Create a registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read pattern library: {}",
                path.as_ref().display()
            )
        })?;

        Self::from_toml(&content)
    }

    /// Create a registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary =
            toml::from_str(content).context("Failed to parse pattern library TOML")?;

        let mut information_lexicon = Vec::new();
        for (key, label) in &library.lexicon.information {
            let info = InformationType::from_label(label).with_context(|| {
                format!("Invalid information type in lexicon entry '{key}': {label}")
            })?;
            information_lexicon.push((key.to_lowercase(), info));
        }

        let mut sensitivity_lexicon = Vec::new();
        for (key, label) in &library.lexicon.sensitivity {
            let sensitivity = SensitivityType::from_label(label).with_context(|| {
                format!("Invalid sensitivity type in lexicon entry '{key}': {label}")
            })?;
            sensitivity_lexicon.push((key.to_lowercase(), sensitivity));
        }

        // Longest fragment first, so "date of birth" wins over "dob"-style
        // overlaps deterministically regardless of TOML map order.
        information_lexicon.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
        sensitivity_lexicon.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));

        let date_formats = match library.datetime {
            Some(section) => section.formats,
            None => DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
        };

        Ok(Self {
            information_lexicon,
            sensitivity_lexicon,
            nric_patterns: compile_all("nric", &library.values.nric.patterns)?,
            phone_patterns: compile_all("phone", &library.values.phone.patterns)?,
            email_patterns: compile_all("email", &library.values.email.patterns)?,
            date_formats,
        })
    }

    /// Create the default registry from the embedded pattern library
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../patterns/classifier_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Information type suggested by the column name, if any.
    ///
    /// Matching is case-insensitive containment of a lexicon fragment in the
    /// column name; the longest fragment wins.
    pub fn lookup_information(&self, column_name: &str) -> Option<InformationType> {
        let name = column_name.to_lowercase();
        self.information_lexicon
            .iter()
            .find(|(fragment, _)| name.contains(fragment))
            .map(|(_, info)| *info)
    }

    /// Sensitivity type suggested by the column name, if any
    pub fn lookup_sensitivity(&self, column_name: &str) -> Option<SensitivityType> {
        let name = column_name.to_lowercase();
        self.sensitivity_lexicon
            .iter()
            .find(|(fragment, _)| name.contains(fragment))
            .map(|(_, sensitivity)| *sensitivity)
    }

    /// NRIC value patterns
    pub fn nric_patterns(&self) -> &[Regex] {
        &self.nric_patterns
    }

    /// Phone number value patterns
    pub fn phone_patterns(&self) -> &[Regex] {
        &self.phone_patterns
    }

    /// Email value patterns
    pub fn email_patterns(&self) -> &[Regex] {
        &self.email_patterns
    }

    /// Date formats probed during column-type detection
    pub fn date_formats(&self) -> &[String] {
        &self.date_formats
    }
}

fn compile_all(name: &str, patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .with_context(|| format!("Invalid regex in pattern set '{name}': {pattern}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_patterns() {
        let registry = PatternRegistry::default_patterns().unwrap();
        assert!(!registry.nric_patterns().is_empty());
        assert!(!registry.phone_patterns().is_empty());
        assert!(!registry.email_patterns().is_empty());
        assert!(!registry.date_formats().is_empty());
    }

    #[test]
    fn test_information_lexicon_lookup() {
        let registry = PatternRegistry::default_patterns().unwrap();

        assert_eq!(
            registry.lookup_information("NRIC"),
            Some(InformationType::Nric)
        );
        assert_eq!(
            registry.lookup_information("employee_fin"),
            Some(InformationType::Nric)
        );
        assert_eq!(
            registry.lookup_information("Monthly Income"),
            Some(InformationType::Salary)
        );
        assert_eq!(
            registry.lookup_information("Date of Birth"),
            Some(InformationType::DateOfBirth)
        );
        assert_eq!(registry.lookup_information("address"), None);
    }

    #[test]
    fn test_sensitivity_lexicon_lookup() {
        let registry = PatternRegistry::default_patterns().unwrap();

        assert_eq!(
            registry.lookup_sensitivity("nric"),
            Some(SensitivityType::DirectIdentifier)
        );
        assert_eq!(
            registry.lookup_sensitivity("Age"),
            Some(SensitivityType::IndirectIdentifier)
        );
        assert_eq!(
            registry.lookup_sensitivity("salary"),
            Some(SensitivityType::Sensitive)
        );
        assert_eq!(registry.lookup_sensitivity("address"), None);
    }

    #[test]
    fn test_nric_pattern() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let pattern = &registry.nric_patterns()[0];

        assert!(pattern.is_match("S1234567A"));
        assert!(pattern.is_match("T7654321Z"));
        assert!(!pattern.is_match("G1234567A"));
        assert!(!pattern.is_match("S123A"));
    }

    #[test]
    fn test_phone_patterns() {
        let registry = PatternRegistry::default_patterns().unwrap();

        let matches = |text: &str| registry.phone_patterns().iter().any(|p| p.is_match(text));
        assert!(matches("91234567"));
        assert!(matches("+65 91234567"));
        assert!(matches("9123 4567"));
        assert!(matches("555-123-4567"));
        assert!(!matches("not a phone"));
        assert!(!matches("1234"));
    }

    #[test]
    fn test_email_pattern() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let pattern = &registry.email_patterns()[0];

        assert!(pattern.is_match("a@x.com"));
        assert!(pattern.is_match("first.last+tag@example.co.uk"));
        assert!(!pattern.is_match("not-an-email"));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            include_str!("../../patterns/classifier_patterns.toml")
        )
        .unwrap();

        let registry = PatternRegistry::from_file(file.path()).unwrap();
        assert!(!registry.nric_patterns().is_empty());
    }

    #[test]
    fn test_invalid_lexicon_label_rejected() {
        let toml = r#"
            [lexicon.information]
            nric = "National ID"

            [lexicon.sensitivity]

            [values.nric]
            patterns = ['^x$']
            [values.phone]
            patterns = ['^x$']
            [values.email]
            patterns = ['^x$']
        "#;

        assert!(PatternRegistry::from_toml(toml).is_err());
    }
}
