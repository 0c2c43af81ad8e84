//! Outbound ports - Interfaces for external services
//!
//! These ports define the contracts that infrastructure adapters must implement,
//! allowing application services to interact with the backend, the broker and
//! local storage without depending on concrete implementations.

pub mod api_port;
pub mod match_action_port;
pub mod platform;
pub mod raw_api_port;
pub mod realtime_port;

pub use api_port::ApiError;
pub use match_action_port::MatchActionPort;
pub use platform::{storage_keys, StorageProvider, TimeProvider};
pub use raw_api_port::RawApiPort;
pub use realtime_port::{
    RealtimeError, RealtimeEvent, RealtimePort, RealtimeSubscription, SubscriptionGuard,
};

#[cfg(any(test, feature = "testing"))]
pub use match_action_port::MockMatchActionPort;
#[cfg(any(test, feature = "testing"))]
pub use raw_api_port::MockRawApiPort;
#[cfg(any(test, feature = "testing"))]
pub use realtime_port::MockRealtimePort;
