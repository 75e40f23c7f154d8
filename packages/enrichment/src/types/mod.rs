//! Core data types for the enrichment library.

pub mod config;
pub mod context;
pub mod email;
pub mod field;
pub mod phase;
pub mod progress;
pub mod result;
