//! Inventory domain module: vending machines, their stock events, and the
//! subscribers that react to them.
//!
//! This crate contains business rules only (no IO). The event flow is:
//!
//! ```text
//! Sale ──(crosses below threshold)──▶ LowStockWarning ──▶ Refill ──(crosses back up)──▶ StockLevelOk
//! ```

pub mod event;
pub mod machine;
pub mod subscribers;

pub use event::{EventKind, LowStockWarning, Refill, Sale, StockEvent, StockLevelOk};
pub use machine::{
    LOW_STOCK_THRESHOLD, Machine, MachineRegistry, SharedRegistry, StockChange, shared,
};
pub use subscribers::{
    LowStockWarningSubscriber, RefillSubscriber, SaleSubscriber, StockLevelOkSubscriber,
    Subscribers, register_subscribers,
};
