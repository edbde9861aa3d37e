//! Event bus mechanics (domain-agnostic).
//!
//! - [`Event`]: what travels through the bus (typed kind + target machine)
//! - [`Subscriber`]: reacts to one kind of event, optionally producing a cascade
//! - [`EventBus`]: subscription registry + fan-out
//! - [`Dispatcher`]: drives cascades to exhaustion (recursive or queue-based)

pub mod bus;
pub mod dispatch;
pub mod event;
pub mod record;
pub mod subscriber;

pub use bus::EventBus;
pub use dispatch::{DEFAULT_MAX_CASCADE_DEPTH, DispatchMode, Dispatcher};
pub use event::Event;
pub use record::{DispatchRecord, DispatchReport};
pub use subscriber::{FnSubscriber, SharedSubscriber, Subscriber};

#[cfg(test)]
pub(crate) mod testing;
