//! Masking configuration

use crate::classifier::patterns::DEFAULT_DATE_FORMATS;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Tunables shared by the transformation functions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskingOptions {
    /// Number of equal-width bins for generalization
    #[serde(default = "default_bins")]
    pub bins: usize,

    /// Character used by full masking and structured-identifier masking
    #[serde(default = "default_mask_char")]
    pub mask_char: char,

    /// Constant sentinel written by suppression
    #[serde(default = "default_suppress_sentinel")]
    pub suppress_sentinel: String,

    /// Leading characters of an email local part left unmasked
    #[serde(default)]
    pub email_retain_chars: usize,

    /// Formats tried when parsing text values as dates
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

fn default_bins() -> usize {
    10
}

fn default_mask_char() -> char {
    '*'
}

fn default_suppress_sentinel() -> String {
    "-".to_string()
}

fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect()
}

impl Default for MaskingOptions {
    fn default() -> Self {
        Self {
            bins: default_bins(),
            mask_char: default_mask_char(),
            suppress_sentinel: default_suppress_sentinel(),
            email_retain_chars: 0,
            date_formats: default_date_formats(),
        }
    }
}

impl MaskingOptions {
    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            anyhow::bail!("bins must be at least 1");
        }
        if self.date_formats.is_empty() {
            anyhow::bail!("date_formats must not be empty");
        }
        Ok(())
    }
}
