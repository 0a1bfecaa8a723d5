//! # Feedline Domain
//!
//! Business domain types for Feedline.
//!
//! This crate contains:
//! - Domain data types (`NewsItem`)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants
//!
//! ## Architecture
//! - Depends only on `feedline-common`, for the `ResilienceFailure` trait
//!   implemented by [`FeedlineError`]
//! - Pure domain models and data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
