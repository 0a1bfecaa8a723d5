//! # Feedline Core
//!
//! Ports and composition logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - The `NewsRepository` port
//! - The resilient decorator that routes every repository call through a
//!   resilience pipeline
//! - The failover composite and the selection strategies it consults
//!
//! ## Architecture Principles
//! - Only depends on `feedline-common` and `feedline-domain`
//! - No HTTP or filesystem code
//! - All data sources behind traits

pub mod news;
pub mod selection;

pub use news::ports::NewsRepository;
pub use news::{FailoverCompositeNewsRepository, ResilientNewsRepository};
pub use selection::{
    AlwaysPreferFallback, CircuitOpenPreferFallback, RepositorySelectionStrategy, Selection,
};
