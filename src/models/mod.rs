//! Domain models for cart-sync
//!
//! This module contains the core domain models used throughout the application.

pub mod payload;
pub mod record;

// Re-export commonly used types
pub use payload::{ContactTagRequest, FieldValueRecord, FieldValueRequest, FieldValuesResponse};
pub use record::{ContactId, FieldId, InputRecord, PlatformId, TagId};
