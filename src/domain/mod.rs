//! Domain models and types for veil.
//!
//! This module contains the tabular data model, the column property model,
//! and the error hierarchy shared by every subsystem.

pub mod dataset;
pub mod errors;
pub mod properties;

pub use dataset::{Column, DType, Dataset, Value};
pub use errors::{Result, TransformError, VeilError};
pub use properties::{
    ColumnProperties, ColumnType, InformationType, PropertyKind, PropertyTable, SensitivityType,
};
