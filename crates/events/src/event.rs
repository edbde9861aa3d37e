use stockloop_core::MachineId;

/// A domain-agnostic event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **tagged** by a closed, typed kind that the bus routes on
/// - **targeted** at a single machine
pub trait Event: Clone + core::fmt::Debug + 'static {
    /// Closed set of event kinds; the subscription key.
    type Kind: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn kind(&self) -> Self::Kind;

    /// Stable event name/type identifier (e.g. "sale").
    fn event_type(&self) -> &'static str;

    /// The machine this event concerns.
    fn machine_id(&self) -> &MachineId;
}
