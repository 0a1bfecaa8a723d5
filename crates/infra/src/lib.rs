//! # Feedline Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The HTTP news repository and the bundled local one
//! - The factory that wires repositories, pipelines and failover together
//! - Configuration loading from the environment and files
//! - Logging setup
//!
//! ## Architecture
//! - Implements traits defined in `feedline-core`
//! - Contains all "impure" code (HTTP, filesystem, global subscriber)

pub mod config;
pub mod errors;
pub mod http;
pub mod news;
pub mod observability;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use news::{MockNewsRepository, NewsRepositoryFactory, RemoteNewsRepository};
pub use observability::init_tracing;
