//! Core types for the binding layer

pub mod error;
pub mod types;

pub use self::error::*;
pub use self::types::*;
