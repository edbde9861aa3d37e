use core::str::FromStr;

use serde::{Deserialize, Serialize};

use stockloop_core::{DomainError, MachineId};
use stockloop_events::Event;

/// Closed set of stock event kinds (the bus subscription key).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Sale,
    Refill,
    LowStockWarning,
    StockLevelOk,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Sale,
        EventKind::Refill,
        EventKind::LowStockWarning,
        EventKind::StockLevelOk,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Sale => "sale",
            EventKind::Refill => "refill",
            EventKind::LowStockWarning => "low_stock_warning",
            EventKind::StockLevelOk => "stock_level_ok",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown event type `{s}`")))
    }
}

/// Event: Sale. Stock decreases by `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub machine_id: MachineId,
    pub quantity: i64,
}

/// Event: Refill. Stock increases by `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refill {
    pub machine_id: MachineId,
    pub quantity: i64,
}

/// Event: LowStockWarning. Stock just dropped below the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockWarning {
    pub machine_id: MachineId,
}

/// Event: StockLevelOk. Stock just climbed back to the threshold or above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevelOk {
    pub machine_id: MachineId,
}

/// Quantities are carried as given; the core never validates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockEvent {
    Sale(Sale),
    Refill(Refill),
    LowStockWarning(LowStockWarning),
    StockLevelOk(StockLevelOk),
}

impl StockEvent {
    pub fn sale(machine_id: impl Into<MachineId>, quantity: i64) -> Self {
        StockEvent::Sale(Sale {
            machine_id: machine_id.into(),
            quantity,
        })
    }

    pub fn refill(machine_id: impl Into<MachineId>, quantity: i64) -> Self {
        StockEvent::Refill(Refill {
            machine_id: machine_id.into(),
            quantity,
        })
    }

    pub fn low_stock_warning(machine_id: impl Into<MachineId>) -> Self {
        StockEvent::LowStockWarning(LowStockWarning {
            machine_id: machine_id.into(),
        })
    }

    pub fn stock_level_ok(machine_id: impl Into<MachineId>) -> Self {
        StockEvent::StockLevelOk(StockLevelOk {
            machine_id: machine_id.into(),
        })
    }

    /// Quantity for `Sale`/`Refill`, `None` for derived events.
    pub fn quantity(&self) -> Option<i64> {
        match self {
            StockEvent::Sale(e) => Some(e.quantity),
            StockEvent::Refill(e) => Some(e.quantity),
            StockEvent::LowStockWarning(_) | StockEvent::StockLevelOk(_) => None,
        }
    }
}

impl Event for StockEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            StockEvent::Sale(_) => EventKind::Sale,
            StockEvent::Refill(_) => EventKind::Refill,
            StockEvent::LowStockWarning(_) => EventKind::LowStockWarning,
            StockEvent::StockLevelOk(_) => EventKind::StockLevelOk,
        }
    }

    fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }

    fn machine_id(&self) -> &MachineId {
        match self {
            StockEvent::Sale(e) => &e.machine_id,
            StockEvent::Refill(e) => &e.machine_id,
            StockEvent::LowStockWarning(e) => &e.machine_id,
            StockEvent::StockLevelOk(e) => &e.machine_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_their_tags() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!("restock".parse::<EventKind>().is_err());
    }

    #[test]
    fn event_exposes_kind_target_and_quantity() {
        let sale = StockEvent::sale("1", 2);
        assert_eq!(sale.kind(), EventKind::Sale);
        assert_eq!(sale.event_type(), "sale");
        assert_eq!(sale.machine_id().as_str(), "1");
        assert_eq!(sale.quantity(), Some(2));

        let warning = StockEvent::low_stock_warning("1");
        assert_eq!(warning.event_type(), "low_stock_warning");
        assert_eq!(warning.quantity(), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(StockEvent::refill("9", 4)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "kind": "refill", "machine_id": "9", "quantity": 4 })
        );
    }

    #[test]
    fn non_positive_quantities_pass_through_unchanged() {
        assert_eq!(StockEvent::sale("1", -5).quantity(), Some(-5));
        assert_eq!(StockEvent::refill("1", 0).quantity(), Some(0));
    }
}
