//! Subscribers for the four stock event kinds.
//!
//! Each subscriber is bound to one [`EventKind`] and ignores every other
//! variant. Registry borrows are scoped to a single statement so a follow-up
//! can be dispatched re-entrantly while the parent event is still in flight.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, info};

use stockloop_events::{EventBus, Subscriber};

use crate::{EventKind, LOW_STOCK_THRESHOLD, SharedRegistry, StockEvent};

/// Decrements stock; warns on a downward threshold crossing.
#[derive(Debug)]
pub struct SaleSubscriber {
    registry: SharedRegistry,
    threshold: i64,
}

impl SaleSubscriber {
    pub fn new(registry: SharedRegistry) -> Self {
        Self::with_threshold(registry, LOW_STOCK_THRESHOLD)
    }

    pub fn with_threshold(registry: SharedRegistry, threshold: i64) -> Self {
        Self {
            registry,
            threshold,
        }
    }
}

impl Subscriber<StockEvent> for SaleSubscriber {
    fn name(&self) -> &str {
        "sale"
    }

    fn handle(&self, event: &StockEvent) -> Option<StockEvent> {
        let StockEvent::Sale(sale) = event else {
            return None;
        };
        let change = self
            .registry
            .borrow_mut()
            .apply_sale(&sale.machine_id, sale.quantity)?;

        change
            .crossed_below(self.threshold)
            .then(|| StockEvent::low_stock_warning(sale.machine_id.clone()))
    }
}

/// Increments stock; reports recovery on an upward threshold crossing.
#[derive(Debug)]
pub struct RefillSubscriber {
    registry: SharedRegistry,
    threshold: i64,
}

impl RefillSubscriber {
    pub fn new(registry: SharedRegistry) -> Self {
        Self::with_threshold(registry, LOW_STOCK_THRESHOLD)
    }

    pub fn with_threshold(registry: SharedRegistry, threshold: i64) -> Self {
        Self {
            registry,
            threshold,
        }
    }
}

impl Subscriber<StockEvent> for RefillSubscriber {
    fn name(&self) -> &str {
        "refill"
    }

    fn handle(&self, event: &StockEvent) -> Option<StockEvent> {
        let StockEvent::Refill(refill) = event else {
            return None;
        };
        let change = self
            .registry
            .borrow_mut()
            .apply_refill(&refill.machine_id, refill.quantity)?;

        change
            .crossed_above(self.threshold)
            .then(|| StockEvent::stock_level_ok(refill.machine_id.clone()))
    }
}

/// Corrective action: orders a refill that brings stock back to the threshold.
#[derive(Debug)]
pub struct LowStockWarningSubscriber {
    registry: SharedRegistry,
    threshold: i64,
}

impl LowStockWarningSubscriber {
    pub fn new(registry: SharedRegistry) -> Self {
        Self::with_threshold(registry, LOW_STOCK_THRESHOLD)
    }

    pub fn with_threshold(registry: SharedRegistry, threshold: i64) -> Self {
        Self {
            registry,
            threshold,
        }
    }
}

impl Subscriber<StockEvent> for LowStockWarningSubscriber {
    fn name(&self) -> &str {
        "low_stock_warning"
    }

    fn handle(&self, event: &StockEvent) -> Option<StockEvent> {
        let StockEvent::LowStockWarning(warning) = event else {
            return None;
        };
        let stock = self.registry.borrow().stock_level(&warning.machine_id)?;

        let quantity = self.threshold.saturating_sub(stock);
        if quantity <= 0 {
            // Stale warning: stock recovered before it was handled.
            debug!(machine_id = %warning.machine_id, stock, "stale low-stock warning; no refill");
            return None;
        }
        Some(StockEvent::refill(warning.machine_id.clone(), quantity))
    }
}

/// Terminal: acknowledges recovery, never cascades.
#[derive(Debug, Default)]
pub struct StockLevelOkSubscriber {
    acknowledged: Cell<u64>,
}

impl StockLevelOkSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `StockLevelOk` events seen so far.
    pub fn acknowledged(&self) -> u64 {
        self.acknowledged.get()
    }
}

impl Subscriber<StockEvent> for StockLevelOkSubscriber {
    fn name(&self) -> &str {
        "stock_level_ok"
    }

    fn handle(&self, event: &StockEvent) -> Option<StockEvent> {
        let StockEvent::StockLevelOk(ok) = event else {
            return None;
        };
        self.acknowledged.set(self.acknowledged.get() + 1);
        info!(machine_id = %ok.machine_id, "stock level ok");
        None
    }
}

/// Handles to the four standard subscribers, as registered on a bus.
#[derive(Debug, Clone)]
pub struct Subscribers {
    pub sale: Rc<SaleSubscriber>,
    pub refill: Rc<RefillSubscriber>,
    pub low_stock_warning: Rc<LowStockWarningSubscriber>,
    pub stock_level_ok: Rc<StockLevelOkSubscriber>,
}

/// Create the four standard subscribers and register each under its kind.
pub fn register_subscribers(
    bus: &mut EventBus<StockEvent>,
    registry: &SharedRegistry,
    threshold: i64,
) -> Subscribers {
    let subs = Subscribers {
        sale: Rc::new(SaleSubscriber::with_threshold(registry.clone(), threshold)),
        refill: Rc::new(RefillSubscriber::with_threshold(registry.clone(), threshold)),
        low_stock_warning: Rc::new(LowStockWarningSubscriber::with_threshold(
            registry.clone(),
            threshold,
        )),
        stock_level_ok: Rc::new(StockLevelOkSubscriber::new()),
    };

    bus.subscribe(EventKind::Sale, subs.sale.clone());
    bus.subscribe(EventKind::Refill, subs.refill.clone());
    bus.subscribe(EventKind::LowStockWarning, subs.low_stock_warning.clone());
    bus.subscribe(EventKind::StockLevelOk, subs.stock_level_ok.clone());
    subs
}
