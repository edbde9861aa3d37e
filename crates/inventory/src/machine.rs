use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use stockloop_core::{DomainError, DomainResult, Entity, MachineId};

/// Stock level boundary: below this a machine is "low".
pub const LOW_STOCK_THRESHOLD: i64 = 3;

/// Entity: a vending machine and its current stock.
///
/// Stock is a plain signed count. It may go negative; nothing clamps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    id: MachineId,
    stock_level: i64,
}

impl Machine {
    pub fn new(id: impl Into<MachineId>, stock_level: i64) -> Self {
        Self {
            id: id.into(),
            stock_level,
        }
    }

    pub fn stock_level(&self) -> i64 {
        self.stock_level
    }
}

impl Entity for Machine {
    type Id = MachineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Stock level before and after a single mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub before: i64,
    pub after: i64,
}

impl StockChange {
    /// Moved from `>= threshold` to `< threshold`.
    pub fn crossed_below(self, threshold: i64) -> bool {
        self.before >= threshold && self.after < threshold
    }

    /// Moved from `< threshold` to `>= threshold`.
    pub fn crossed_above(self, threshold: i64) -> bool {
        self.before < threshold && self.after >= threshold
    }
}

/// The set of machines for one run, keyed by id.
///
/// Only the owner adds machines; subscribers adjust stock of existing
/// entries through [`apply_sale`](Self::apply_sale) and
/// [`apply_refill`](Self::apply_refill).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineRegistry {
    machines: BTreeMap<MachineId, Machine>,
}

/// Registry handle injected into subscribers (single-threaded).
pub type SharedRegistry = Rc<RefCell<MachineRegistry>>;

/// Wrap a registry for sharing with subscribers.
pub fn shared(registry: MachineRegistry) -> SharedRegistry {
    Rc::new(RefCell::new(registry))
}

impl MachineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry, rejecting duplicate ids.
    pub fn from_machines(machines: impl IntoIterator<Item = Machine>) -> DomainResult<Self> {
        let mut registry = Self::new();
        for machine in machines {
            registry.add(machine)?;
        }
        Ok(registry)
    }

    pub fn add(&mut self, machine: Machine) -> DomainResult<()> {
        if self.machines.contains_key(machine.id()) {
            return Err(DomainError::conflict(format!(
                "machine `{}` already registered",
                machine.id()
            )));
        }
        self.machines.insert(machine.id().clone(), machine);
        Ok(())
    }

    pub fn get(&self, id: &MachineId) -> Option<&Machine> {
        self.machines.get(id)
    }

    pub fn stock_level(&self, id: &MachineId) -> Option<i64> {
        self.get(id).map(Machine::stock_level)
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &MachineId> {
        self.machines.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Machine> {
        self.machines.values()
    }

    /// Stock levels by id, in id order.
    pub fn snapshot(&self) -> BTreeMap<MachineId, i64> {
        self.machines
            .iter()
            .map(|(id, m)| (id.clone(), m.stock_level))
            .collect()
    }

    /// Decrease stock by `quantity`, saturating at the `i64` bounds.
    /// `None` if the machine is unknown.
    pub fn apply_sale(&mut self, id: &MachineId, quantity: i64) -> Option<StockChange> {
        self.adjust(id, |stock| stock.saturating_sub(quantity))
    }

    /// Increase stock by `quantity`, saturating at the `i64` bounds.
    /// `None` if the machine is unknown.
    pub fn apply_refill(&mut self, id: &MachineId, quantity: i64) -> Option<StockChange> {
        self.adjust(id, |stock| stock.saturating_add(quantity))
    }

    fn adjust(&mut self, id: &MachineId, f: impl FnOnce(i64) -> i64) -> Option<StockChange> {
        let machine = self.machines.get_mut(id)?;
        let before = machine.stock_level;
        machine.stock_level = f(before);
        Some(StockChange {
            before,
            after: machine.stock_level,
        })
    }
}
