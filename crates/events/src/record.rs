use serde::Serialize;

use crate::{DispatchMode, Event};

/// One delivered event, with its position in the cascade.
///
/// Notes:
/// - `sequence` is the 1-based delivery position within a single drain.
/// - `depth` is 0 for seeded (root) events and +1 per cascade hop.
/// - `cause` is the `sequence` of the event whose handling produced this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchRecord<E> {
    sequence: u64,
    depth: usize,
    cause: Option<u64>,
    event: E,
}

impl<E> DispatchRecord<E> {
    pub fn new(sequence: u64, depth: usize, cause: Option<u64>, event: E) -> Self {
        Self {
            sequence,
            depth,
            cause,
            event,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn cause(&self) -> Option<u64> {
        self.cause
    }

    pub fn event(&self) -> &E {
        &self.event
    }

    pub fn into_event(self) -> E {
        self.event
    }
}

/// Outcome of draining one or more root events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport<E> {
    mode: DispatchMode,
    delivered: Vec<DispatchRecord<E>>,
    truncated: Vec<E>,
}

impl<E: Event> DispatchReport<E> {
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            delivered: Vec::new(),
            truncated: Vec::new(),
        }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Every delivered event, in delivery order.
    pub fn delivered(&self) -> &[DispatchRecord<E>] {
        &self.delivered
    }

    /// Cascades dropped by the depth cap.
    pub fn truncated(&self) -> &[E] {
        &self.truncated
    }

    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }

    /// `true` when no cascade was cut off by the depth cap.
    pub fn is_complete(&self) -> bool {
        self.truncated.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &E> {
        self.delivered.iter().map(DispatchRecord::event)
    }

    pub fn count_of(&self, kind: E::Kind) -> usize {
        self.events().filter(|e| e.kind() == kind).count()
    }

    /// Look up a delivered record by its sequence number.
    pub fn record(&self, sequence: u64) -> Option<&DispatchRecord<E>> {
        // Sequences are dense and start at 1.
        let idx = usize::try_from(sequence.checked_sub(1)?).ok()?;
        self.delivered.get(idx)
    }

    /// Greatest cascade depth reached.
    pub fn max_depth(&self) -> usize {
        self.delivered.iter().map(DispatchRecord::depth).max().unwrap_or(0)
    }

    pub(crate) fn next_sequence(&self) -> u64 {
        self.delivered.len() as u64 + 1
    }

    pub(crate) fn push_delivered(&mut self, record: DispatchRecord<E>) {
        self.delivered.push(record);
    }

    pub(crate) fn push_truncated(&mut self, event: E) {
        self.truncated.push(event);
    }
}
