//! Plumbing between the broker transport and the application.
//!
//! - `EventBus`: fan-out of decoded real-time events
//! - `ConnectionHandle`: owns a broker link and exposes its state

pub mod connection;
pub mod event_bus;

pub use connection::{state_channel, ConnectionHandle, ConnectionState, StatePublisher};
pub use event_bus::EventBus;
