#[allow(clippy::module_inception)]
pub mod container;
pub mod key;
pub mod registry;

pub use container::Container;
pub use key::ServiceKey;
pub use registry::{RegisteredService, ServiceEntry, ServiceRegistry};
