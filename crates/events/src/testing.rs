//! Minimal event type for exercising the bus mechanics in isolation.

use stockloop_core::MachineId;

use crate::Event;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestKind {
    Ping,
    Pong,
}

impl core::fmt::Display for TestKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            TestKind::Ping => "ping",
            TestKind::Pong => "pong",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEvent {
    pub kind: TestKind,
    pub machine_id: MachineId,
    pub hops: u32,
}

impl TestEvent {
    pub fn ping(machine: &str, hops: u32) -> Self {
        Self {
            kind: TestKind::Ping,
            machine_id: MachineId::new(machine),
            hops,
        }
    }

    pub fn pong(machine: &str, hops: u32) -> Self {
        Self {
            kind: TestKind::Pong,
            machine_id: MachineId::new(machine),
            hops,
        }
    }
}

impl Event for TestEvent {
    type Kind = TestKind;

    fn kind(&self) -> TestKind {
        self.kind
    }

    fn event_type(&self) -> &'static str {
        match self.kind {
            TestKind::Ping => "ping",
            TestKind::Pong => "pong",
        }
    }

    fn machine_id(&self) -> &MachineId {
        &self.machine_id
    }
}
