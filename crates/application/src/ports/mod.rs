//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod navigator;
mod storage;
mod transport;

pub use clock::Clock;
pub use navigator::{Navigator, NullNavigator};
pub use storage::{KeyValueStore, StorageError};
pub use transport::{Attempt, HttpTransport, PreparedRequest, TransportError};
