//! Root event producers.
//!
//! The bus does not care where events come from: anything that yields
//! [`StockEvent`]s is an [`EventSource`]. [`RandomEventSource`] is the
//! seeded generator used for manual runs.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use stockloop_core::MachineId;
use stockloop_inventory::StockEvent;

/// A finite or infinite stream of root events.
pub trait EventSource: Iterator<Item = StockEvent> {}

impl<T> EventSource for T where T: Iterator<Item = StockEvent> {}

/// Seeded generator of `Sale`/`Refill` events.
///
/// The same seed, machine list and settings always yield the same sequence.
#[derive(Debug, Clone)]
pub struct RandomEventSource {
    rng: StdRng,
    machine_ids: Vec<MachineId>,
    remaining: usize,
    sale_probability: f64,
    max_quantity: i64,
}

impl RandomEventSource {
    pub fn new(seed: u64, machine_ids: Vec<MachineId>, count: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            machine_ids,
            remaining: count,
            sale_probability: 0.7,
            max_quantity: 3,
        }
    }

    /// Chance of a sale (vs. a refill); clamped to `0.0..=1.0`.
    pub fn with_sale_probability(mut self, p: f64) -> Self {
        self.sale_probability = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self
    }

    /// Quantities are drawn from `1..=max_quantity` (at least 1).
    pub fn with_max_quantity(mut self, max_quantity: i64) -> Self {
        self.max_quantity = max_quantity.max(1);
        self
    }
}

impl Iterator for RandomEventSource {
    type Item = StockEvent;

    fn next(&mut self) -> Option<StockEvent> {
        if self.remaining == 0 {
            return None;
        }
        let machine_id = self.machine_ids.choose(&mut self.rng)?.clone();
        self.remaining -= 1;

        let quantity = self.rng.gen_range(1..=self.max_quantity);
        if self.rng.gen_bool(self.sale_probability) {
            Some(StockEvent::sale(machine_id, quantity))
        } else {
            Some(StockEvent::refill(machine_id, quantity))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.machine_ids.is_empty() {
            (0, Some(0))
        } else {
            (self.remaining, Some(self.remaining))
        }
    }
}
