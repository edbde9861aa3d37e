//! `stockloop-sim` — drives stock events through the bus.
//!
//! Owns the machine registry and the bus, wires the standard subscribers,
//! seeds events from an [`EventSource`] and drains every cascade.

pub mod config;
pub mod driver;
pub mod source;

pub use config::{ConfigError, SimConfig};
pub use driver::{Driver, RunReport, RunSummary};
pub use source::{EventSource, RandomEventSource};
