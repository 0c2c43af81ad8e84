//! Player port definitions.
//!
//! Application services depend only on these traits; infrastructure adapters
//! implement them and the composition root wires the two together.

pub mod outbound;
