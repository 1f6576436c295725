//! # Clockwork Core
//!
//! Core types, domain model, and error definitions for Clockwork attendance
//! reporting. Everything here is engine-agnostic: the repository crate
//! produces these types regardless of which backing store answered.

pub mod date_range;
pub mod domain;
pub mod error;
pub mod pagination;
pub mod result;
pub mod solar;
pub mod telemetry;
pub mod validation;

pub use date_range::*;
pub use domain::*;
pub use error::*;
pub use pagination::*;
pub use result::*;
pub use validation::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
