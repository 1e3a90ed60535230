// Veil - Tabular Data Anonymization
// Copyright (c) 2025 Veil Contributors
// Licensed under the MIT License

//! # Veil - Tabular Data Anonymization
//!
//! Veil classifies the columns of an in-memory tabular dataset by
//! privacy-relevant properties, recommends and applies data-masking
//! transformations, and quantifies the residual re-identification risk of
//! the result through equivalence-class analysis.
//!
//! ## Architecture
//!
//! Veil follows a layered architecture:
//!
//! - [`domain`] - Dataset model, column properties, and error types
//! - [`classifier`] - Multi-stage heuristic property classification
//! - [`masking`] - Transformation catalog, recommender, and transforms
//! - [`engine`] - Anonymization controller and state machine
//! - [`risk`] - Equivalence classes and re-identification metrics
//!
//! ## Quick Start
//!
//! ```rust
//! use veil::domain::{Column, Dataset, Value};
//! use veil::engine::Anonymizer;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = Dataset::new(vec![
//!         (
//!             "nric".to_string(),
//!             Column::new(vec![
//!                 Value::Text("S1234567A".to_string()),
//!                 Value::Text("S7654321B".to_string()),
//!             ]),
//!         ),
//!         (
//!             "age".to_string(),
//!             Column::new(vec![Value::Int(25), Value::Int(25)]),
//!         ),
//!     ])?;
//!
//!     // Classify, recommend, mask
//!     let mut engine = Anonymizer::new(dataset)?;
//!     engine.build_mask_table();
//!     let outcome = engine.apply_masking()?;
//!     println!("masked {} rows", outcome.masked.row_count());
//!
//!     // Quantify residual risk against the recommendation baseline
//!     let risk = engine.assess_risk()?;
//!     println!(
//!         "average re-identification probability: {:.1}%",
//!         risk.active.average_probability
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Veil uses the [`domain::VeilError`] type for all errors:
//!
//! ```rust,no_run
//! use veil::domain::{Dataset, VeilError};
//!
//! fn example(columns: Vec<(String, veil::domain::Column)>) -> Result<(), VeilError> {
//!     // Errors are automatically converted using the ? operator
//!     let dataset = Dataset::new(columns)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Veil instruments its orchestration points with the `tracing` crate;
//! install any `tracing-subscriber` in the host application to see them.

pub mod classifier;
pub mod domain;
pub mod engine;
pub mod masking;
pub mod risk;

pub use domain::{Result, VeilError};
pub use engine::Anonymizer;
