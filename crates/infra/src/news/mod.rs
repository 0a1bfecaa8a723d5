//! News repository adapters and wiring

pub mod factory;
pub mod mock;
pub mod remote;

pub use factory::NewsRepositoryFactory;
pub use mock::MockNewsRepository;
pub use remote::RemoteNewsRepository;
