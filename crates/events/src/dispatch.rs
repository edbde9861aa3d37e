//! Cascade drivers.
//!
//! A subscriber may answer an event with a follow-up event, which must itself
//! be delivered, and so on until nothing new is produced. Two disciplines are
//! supported:
//!
//! - [`DispatchMode::Recursive`]: each follow-up is delivered as soon as it is
//!   produced, before the next subscriber of the parent event runs
//!   (depth-first).
//! - [`DispatchMode::Queue`]: follow-ups are appended to a pending FIFO queue
//!   that is drained after all seeded events (breadth-first).
//!
//! Both stop at `max_cascade_depth`: a follow-up that would be delivered deeper
//! than the cap is dropped, logged, and recorded as truncated.

use std::collections::VecDeque;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use stockloop_core::DomainError;

use crate::{DispatchRecord, DispatchReport, Event, EventBus};

/// Default cap on cascade depth (root events are depth 0).
pub const DEFAULT_MAX_CASCADE_DEPTH: usize = 16;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Depth-first, re-entrant delivery.
    #[default]
    Recursive,
    /// Breadth-first delivery through a FIFO work queue.
    Queue,
}

impl DispatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchMode::Recursive => "recursive",
            DispatchMode::Queue => "queue",
        }
    }
}

impl core::fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DispatchMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recursive" | "eager" => Ok(DispatchMode::Recursive),
            "queue" | "fifo" => Ok(DispatchMode::Queue),
            other => Err(DomainError::validation(format!(
                "unknown dispatch mode `{other}` (expected `recursive` or `queue`)"
            ))),
        }
    }
}

/// An event waiting to be delivered, with its cascade position.
#[derive(Debug)]
struct Pending<E> {
    event: E,
    depth: usize,
    cause: Option<u64>,
}

/// Drives events through an [`EventBus`] until no follow-ups remain.
#[derive(Debug)]
pub struct Dispatcher<'a, E: Event> {
    bus: &'a EventBus<E>,
    mode: DispatchMode,
    max_cascade_depth: usize,
}

impl<'a, E: Event> Dispatcher<'a, E> {
    pub fn new(bus: &'a EventBus<E>, mode: DispatchMode) -> Self {
        Self {
            bus,
            mode,
            max_cascade_depth: DEFAULT_MAX_CASCADE_DEPTH,
        }
    }

    pub fn with_max_cascade_depth(mut self, max_cascade_depth: usize) -> Self {
        self.max_cascade_depth = max_cascade_depth;
        self
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn max_cascade_depth(&self) -> usize {
        self.max_cascade_depth
    }

    /// Deliver a single root event and everything it cascades into.
    pub fn dispatch(&self, event: E) -> DispatchReport<E> {
        self.drain(std::iter::once(event))
    }

    /// Deliver a batch of root events and everything they cascade into.
    pub fn drain(&self, events: impl IntoIterator<Item = E>) -> DispatchReport<E> {
        let mut report = DispatchReport::new(self.mode);
        let roots = events.into_iter().map(|event| Pending {
            event,
            depth: 0,
            cause: None,
        });

        match self.mode {
            DispatchMode::Recursive => {
                for root in roots {
                    self.deliver_recursive(root, &mut report);
                }
            }
            DispatchMode::Queue => {
                let mut pending: VecDeque<_> = roots.collect();
                self.drain_queue(&mut pending, &mut report);
            }
        }

        debug!(
            mode = %self.mode,
            delivered = report.len(),
            truncated = report.truncated().len(),
            max_depth = report.max_depth(),
            "drain complete"
        );
        report
    }

    fn deliver_recursive(&self, pending: Pending<E>, report: &mut DispatchReport<E>) {
        let depth = pending.depth;
        let Some((sequence, event)) = self.record(pending, report) else {
            return;
        };

        self.bus.publish_with(&event, |follow_up| {
            self.deliver_recursive(
                Pending {
                    event: follow_up,
                    depth: depth + 1,
                    cause: Some(sequence),
                },
                report,
            );
        });
    }

    fn drain_queue(&self, pending: &mut VecDeque<Pending<E>>, report: &mut DispatchReport<E>) {
        while let Some(next) = pending.pop_front() {
            let depth = next.depth;
            let Some((sequence, event)) = self.record(next, report) else {
                continue;
            };

            self.bus.publish_with(&event, |follow_up| {
                pending.push_back(Pending {
                    event: follow_up,
                    depth: depth + 1,
                    cause: Some(sequence),
                });
            });
        }
    }

    /// Admit `pending` into the report, or truncate it if it is too deep.
    fn record(&self, pending: Pending<E>, report: &mut DispatchReport<E>) -> Option<(u64, E)> {
        if pending.depth > self.max_cascade_depth {
            warn!(
                event_type = pending.event.event_type(),
                machine_id = %pending.event.machine_id(),
                depth = pending.depth,
                limit = self.max_cascade_depth,
                "cascade depth limit reached; dropping follow-up"
            );
            report.push_truncated(pending.event);
            return None;
        }

        let sequence = report.next_sequence();
        debug!(
            sequence,
            depth = pending.depth,
            event_type = pending.event.event_type(),
            machine_id = %pending.event.machine_id(),
            "deliver"
        );
        report.push_delivered(DispatchRecord::new(
            sequence,
            pending.depth,
            pending.cause,
            pending.event.clone(),
        ));
        Some((sequence, pending.event))
    }
}
