//! Platform-specific implementations of the storage and time ports.

mod desktop;
pub mod mock;

pub use desktop::{DesktopStorageProvider, DesktopTimeProvider};
pub use mock::{FixedTimeProvider, MemoryStorageProvider};
