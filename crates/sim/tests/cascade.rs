//! End-to-end cascade behaviour through the standard driver wiring.

use std::rc::Rc;

use proptest::prelude::*;

use stockloop_core::MachineId;
use stockloop_events::{DispatchMode, Event};
use stockloop_inventory::{
    EventKind, LowStockWarningSubscriber, Machine, MachineRegistry, StockEvent,
};
use stockloop_sim::{Driver, SimConfig};

const MODES: [DispatchMode; 2] = [DispatchMode::Recursive, DispatchMode::Queue];

fn driver(stock: i64, mode: DispatchMode) -> Driver {
    let config = SimConfig {
        mode,
        ..SimConfig::default()
    };
    let machines = MachineRegistry::from_machines([Machine::new("1", stock)]).unwrap();
    Driver::new(&config, machines)
}

fn kinds(events: impl Iterator<Item = StockEvent>) -> Vec<EventKind> {
    events.map(|e| e.kind()).collect()
}

fn m1() -> MachineId {
    MachineId::new("1")
}

#[test]
fn downward_crossing_emits_exactly_one_warning() {
    for mode in MODES {
        let mut d = driver(3, mode);
        // Isolate the warning from its corrective refill.
        let warning = d.subscribers().low_stock_warning.clone();
        d.bus_mut().unsubscribe(EventKind::LowStockWarning, &warning);

        let report = d.run([StockEvent::sale("1", 1)].into_iter());

        assert_eq!(d.stock_level(&m1()), Some(2), "{mode}");
        assert_eq!(report.dispatch().count_of(EventKind::LowStockWarning), 1, "{mode}");
        let warning_event = report.dispatch().delivered()[1].event();
        assert_eq!(warning_event, &StockEvent::low_stock_warning("1"), "{mode}");
    }
}

#[test]
fn already_low_stock_does_not_rewarn() {
    for mode in MODES {
        let d = driver(2, mode);
        let report = d.run([StockEvent::sale("1", 1)].into_iter());

        assert_eq!(d.stock_level(&m1()), Some(1), "{mode}");
        assert_eq!(report.dispatch().count_of(EventKind::LowStockWarning), 0, "{mode}");
        assert_eq!(report.dispatch().len(), 1, "{mode}");
    }
}

#[test]
fn upward_crossing_emits_exactly_one_ok() {
    for mode in MODES {
        let d = driver(2, mode);
        let report = d.run([StockEvent::refill("1", 3)].into_iter());

        assert_eq!(d.stock_level(&m1()), Some(5), "{mode}");
        assert_eq!(report.dispatch().count_of(EventKind::StockLevelOk), 1, "{mode}");
        assert_eq!(d.subscribers().stock_level_ok.acknowledged(), 1, "{mode}");
    }
}

#[test]
fn sale_cascade_resolves_back_to_threshold() {
    for mode in MODES {
        let d = driver(3, mode);
        let report = d.run([StockEvent::sale("1", 2)].into_iter());

        assert_eq!(d.stock_level(&m1()), Some(3), "{mode}");
        assert_eq!(
            report.dispatch().events().cloned().collect::<Vec<_>>(),
            vec![
                StockEvent::sale("1", 2),
                StockEvent::low_stock_warning("1"),
                StockEvent::refill("1", 2),
                StockEvent::stock_level_ok("1"),
            ],
            "{mode}"
        );
        assert!(report.dispatch().is_complete(), "{mode}");
    }
}

#[test]
fn unknown_machine_changes_nothing() {
    for mode in MODES {
        let d = driver(3, mode);
        let before = d.registry().clone();

        let report = d.run([StockEvent::sale("999", 1)].into_iter());

        assert_eq!(*d.registry(), before, "{mode}");
        assert_eq!(report.dispatch().len(), 1, "{mode}");
    }
}

#[test]
fn unsubscribed_sale_handler_is_not_invoked() {
    for mode in MODES {
        let mut d = driver(3, mode);
        let sale = d.subscribers().sale.clone();
        assert!(d.bus_mut().unsubscribe(EventKind::Sale, &sale));

        let report = d.run([StockEvent::sale("1", 1)].into_iter());

        assert_eq!(d.stock_level(&m1()), Some(3), "{mode}");
        assert_eq!(
            kinds(report.dispatch().events().cloned()),
            vec![EventKind::Sale],
            "{mode}"
        );
    }
}

#[test]
fn resubscribing_is_idempotent() {
    for mode in MODES {
        let mut d = driver(10, mode);
        let sale = d.subscribers().sale.clone();
        assert!(!d.bus_mut().subscribe(EventKind::Sale, sale));

        d.run([StockEvent::sale("1", 1)].into_iter());

        assert_eq!(d.stock_level(&m1()), Some(9), "{mode}");
    }
}

#[test]
fn stale_warning_is_suppressed_in_queue_mode() {
    let roots = [StockEvent::sale("1", 1), StockEvent::refill("1", 5)];

    // Queue: the warning is handled after the refill already restored stock.
    let q = driver(3, DispatchMode::Queue);
    let report = q.run(roots.clone().into_iter());
    assert_eq!(q.stock_level(&m1()), Some(7));
    assert_eq!(report.dispatch().count_of(EventKind::Refill), 1);

    // Recursive: the warning is resolved before the second root is seen.
    let r = driver(3, DispatchMode::Recursive);
    let report = r.run(roots.into_iter());
    assert_eq!(r.stock_level(&m1()), Some(8));
    assert_eq!(report.dispatch().count_of(EventKind::Refill), 2);
}

#[test]
fn every_subscriber_cascade_is_scheduled() {
    // A second warning handler means two corrective refills per warning.
    let mut q = driver(3, DispatchMode::Queue);
    let extra = Rc::new(LowStockWarningSubscriber::new(q.shared_registry()));
    q.bus_mut().subscribe(EventKind::LowStockWarning, extra.clone());

    let report = q.run([StockEvent::sale("1", 2)].into_iter());
    assert_eq!(report.dispatch().count_of(EventKind::Refill), 2);
    assert_eq!(q.stock_level(&m1()), Some(5));

    // Recursive delivery resolves the first refill before the second handler
    // runs, so the second one sees a recovered machine and stands down.
    let mut r = driver(3, DispatchMode::Recursive);
    let extra = Rc::new(LowStockWarningSubscriber::new(r.shared_registry()));
    r.bus_mut().subscribe(EventKind::LowStockWarning, extra);

    let report = r.run([StockEvent::sale("1", 2)].into_iter());
    assert_eq!(report.dispatch().count_of(EventKind::Refill), 1);
    assert_eq!(r.stock_level(&m1()), Some(3));
}

fn root_events() -> impl Strategy<Value = Vec<StockEvent>> {
    let one = (0usize..4, any::<bool>(), 1i64..6).prop_map(|(machine, is_sale, quantity)| {
        // Index 3 targets a machine that does not exist.
        let id = ["1", "2", "3", "999"][machine];
        if is_sale {
            StockEvent::sale(id, quantity)
        } else {
            StockEvent::refill(id, quantity)
        }
    });
    prop::collection::vec(one, 0..40)
}

fn three_machine_driver(initial: i64, mode: DispatchMode) -> Driver {
    Driver::from_config(&SimConfig {
        mode,
        machines: 3,
        initial_stock: initial,
        ..SimConfig::default()
    })
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// Property: final stock equals initial stock minus delivered sales plus
    /// delivered refills, per machine, in both disciplines.
    #[test]
    fn stock_is_conserved(initial in -3i64..8, roots in root_events()) {
        for mode in MODES {
            let d = three_machine_driver(initial, mode);
            let report = d.run(roots.clone().into_iter());
            prop_assert!(report.dispatch().is_complete());

            for id in ["1", "2", "3"] {
                let id = MachineId::new(id);
                let net: i64 = report
                    .dispatch()
                    .events()
                    .filter(|e| e.machine_id() == &id)
                    .map(|e| match e {
                        StockEvent::Sale(s) => -s.quantity,
                        StockEvent::Refill(r) => r.quantity,
                        _ => 0,
                    })
                    .sum();
                prop_assert_eq!(report.final_stock(&id), Some(initial + net));
                prop_assert_eq!(d.stock_level(&id), Some(initial + net));
            }
        }
    }

    /// Property: derived events are always caused by the right parent on the
    /// same machine.
    #[test]
    fn derived_events_have_matching_causes(initial in -3i64..8, roots in root_events()) {
        for mode in MODES {
            let d = three_machine_driver(initial, mode);
            let report = d.run(roots.clone().into_iter());
            let dispatch = report.dispatch();

            for record in dispatch.delivered() {
                let expected_parent = match record.event().kind() {
                    EventKind::LowStockWarning => EventKind::Sale,
                    EventKind::StockLevelOk => EventKind::Refill,
                    EventKind::Refill if record.depth() > 0 => EventKind::LowStockWarning,
                    _ => {
                        prop_assert_eq!(record.depth(), 0);
                        prop_assert_eq!(record.cause(), None);
                        continue;
                    }
                };
                let parent = record.cause().and_then(|c| dispatch.record(c));
                prop_assert!(parent.is_some());
                let parent = parent.unwrap().event();
                prop_assert_eq!(parent.kind(), expected_parent);
                prop_assert_eq!(parent.machine_id(), record.event().machine_id());
            }
        }
    }

    /// Property: with depth-first delivery every downward crossing is
    /// corrected before the next root event, so machines that start at or
    /// above the threshold also finish there.
    #[test]
    fn recursive_mode_restores_threshold(initial in 3i64..8, roots in root_events()) {
        let d = three_machine_driver(initial, DispatchMode::Recursive);
        let report = d.run(roots.into_iter());

        for stock in report.summary().final_stock.values() {
            prop_assert!(*stock >= 3, "stock {}", stock);
        }
        prop_assert_eq!(
            report.dispatch().count_of(EventKind::LowStockWarning),
            report.dispatch().count_of(EventKind::StockLevelOk)
        );
    }
}
