//! News repository port and decorators

pub mod failover;
pub mod ports;
pub mod resilient;

pub use failover::FailoverCompositeNewsRepository;
pub use ports::NewsRepository;
pub use resilient::ResilientNewsRepository;
