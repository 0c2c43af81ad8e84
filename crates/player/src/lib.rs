//! GalaxyTalk Player crate.
//!
//! Client side of the matching flow: REST services, the matching room state
//! machine, and adapters for the backend, the STOMP broker and local storage.

pub mod application;
pub mod config;
pub mod infrastructure;
pub mod ports;
pub mod runner;

pub use config::PlayerConfig;
pub use runner::{run, RunnerDeps};
