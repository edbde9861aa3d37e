//! Run orchestration.
//!
//! ```text
//! EventSource ──seed──▶ Dispatcher ──publish──▶ EventBus ──▶ Subscribers ──▶ MachineRegistry
//!                           ▲                                      │
//!                           └──────────── follow-up events ────────┘
//! ```
//!
//! The driver is the only owner allowed to create machines. It registers the
//! four standard subscribers before any event is published, then drains every
//! seeded event (and its cascades) with the configured dispatch discipline.

use std::cell::Ref;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use stockloop_core::{DomainResult, MachineId};
use stockloop_events::{DispatchMode, DispatchReport, Dispatcher, EventBus};
use stockloop_inventory::{
    EventKind, Machine, MachineRegistry, SharedRegistry, StockEvent, Subscribers,
    register_subscribers, shared,
};

use crate::{EventSource, RandomEventSource, SimConfig};

/// Condensed outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mode: DispatchMode,
    pub delivered: usize,
    pub truncated: usize,
    pub max_depth: usize,
    pub by_kind: BTreeMap<EventKind, usize>,
    pub stock_ok_acknowledged: u64,
    pub final_stock: BTreeMap<MachineId, i64>,
}

/// Full outcome of a run: summary plus the delivery trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    summary: RunSummary,
    dispatch: DispatchReport<StockEvent>,
}

impl RunReport {
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn dispatch(&self) -> &DispatchReport<StockEvent> {
        &self.dispatch
    }

    pub fn final_stock(&self, id: &MachineId) -> Option<i64> {
        self.summary.final_stock.get(id).copied()
    }
}

#[derive(Debug)]
pub struct Driver {
    registry: SharedRegistry,
    bus: EventBus<StockEvent>,
    subscribers: Subscribers,
    mode: DispatchMode,
    max_cascade_depth: usize,
}

impl Driver {
    /// Take ownership of `machines` and wire the standard subscribers.
    pub fn new(config: &SimConfig, machines: MachineRegistry) -> Self {
        let registry = shared(machines);
        let mut bus = EventBus::new();
        let subscribers = register_subscribers(&mut bus, &registry, config.threshold);

        Self {
            registry,
            bus,
            subscribers,
            mode: config.mode,
            max_cascade_depth: config.max_cascade_depth,
        }
    }

    /// Driver over machines `"1"..="n"`, each at `config.initial_stock`.
    pub fn from_config(config: &SimConfig) -> DomainResult<Self> {
        let machines = MachineRegistry::from_machines(
            (1..=config.machines).map(|n| Machine::new(MachineId::new(n.to_string()), config.initial_stock)),
        )?;
        Ok(Self::new(config, machines))
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn bus(&self) -> &EventBus<StockEvent> {
        &self.bus
    }

    /// Mutable bus access, e.g. to unsubscribe a standard subscriber.
    pub fn bus_mut(&mut self) -> &mut EventBus<StockEvent> {
        &mut self.bus
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    /// Current registry contents. Do not hold across [`run`](Self::run).
    pub fn registry(&self) -> Ref<'_, MachineRegistry> {
        self.registry.borrow()
    }

    /// Registry handle for wiring additional subscribers.
    pub fn shared_registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    pub fn stock_level(&self, id: &MachineId) -> Option<i64> {
        self.registry.borrow().stock_level(id)
    }

    /// Seeded random source over this driver's machines.
    pub fn random_source(&self, config: &SimConfig) -> RandomEventSource {
        let ids = self.registry.borrow().ids().cloned().collect();
        RandomEventSource::new(config.seed, ids, config.events)
            .with_sale_probability(config.sale_probability)
            .with_max_quantity(config.max_quantity)
    }

    /// Deliver every event from `source` and all cascades, then report.
    pub fn run(&self, source: impl EventSource) -> RunReport {
        let dispatch = Dispatcher::new(&self.bus, self.mode)
            .with_max_cascade_depth(self.max_cascade_depth)
            .drain(source);

        let by_kind = EventKind::ALL
            .into_iter()
            .map(|kind| (kind, dispatch.count_of(kind)))
            .collect();

        let summary = RunSummary {
            mode: self.mode,
            delivered: dispatch.len(),
            truncated: dispatch.truncated().len(),
            max_depth: dispatch.max_depth(),
            by_kind,
            stock_ok_acknowledged: self.subscribers.stock_level_ok.acknowledged(),
            final_stock: self.registry.borrow().snapshot(),
        };

        info!(
            mode = %summary.mode,
            delivered = summary.delivered,
            truncated = summary.truncated,
            max_depth = summary.max_depth,
            "run complete"
        );

        RunReport { summary, dispatch }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_creates_numbered_machines() {
        let config = SimConfig {
            machines: 4,
            initial_stock: 6,
            ..SimConfig::default()
        };
        let driver = Driver::from_config(&config).unwrap();

        let ids: Vec<_> = driver.registry().ids().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
        assert!(driver.registry().iter().all(|m| m.stock_level() == 6));
    }

    #[test]
    fn all_four_roles_are_registered_before_any_publish() {
        let driver = Driver::from_config(&SimConfig::default()).unwrap();
        assert_eq!(driver.bus().total_subscriptions(), 4);
    }

    #[test]
    fn empty_source_is_a_no_op_run() {
        let driver = Driver::from_config(&SimConfig::default()).unwrap();
        let report = driver.run(std::iter::empty());

        assert_eq!(report.summary().delivered, 0);
        assert_eq!(report.final_stock(&MachineId::new("1")), Some(10));
    }

    #[test]
    fn summary_counts_every_kind() {
        let driver = Driver::from_config(&SimConfig {
            initial_stock: 3,
            ..SimConfig::default()
        })
        .unwrap();
        let report = driver.run([StockEvent::sale("1", 2)].into_iter());

        let by_kind = &report.summary().by_kind;
        assert_eq!(by_kind[&EventKind::Sale], 1);
        assert_eq!(by_kind[&EventKind::LowStockWarning], 1);
        assert_eq!(by_kind[&EventKind::Refill], 1);
        assert_eq!(by_kind[&EventKind::StockLevelOk], 1);
        assert_eq!(report.summary().stock_ok_acknowledged, 1);
        assert_eq!(report.summary().max_depth, 3);
    }

    #[test]
    fn summary_serializes_to_json() {
        let driver = Driver::from_config(&SimConfig::default()).unwrap();
        let report = driver.run([StockEvent::sale("2", 1)].into_iter());

        let json = serde_json::to_value(report.summary()).unwrap();
        assert_eq!(json["mode"], "recursive");
        assert_eq!(json["by_kind"]["sale"], 1);
        assert_eq!(json["final_stock"]["2"], 9);
    }
}
