use std::rc::Rc;

use crate::Event;

/// Reacts to a delivered event and optionally produces a follow-up (cascade).
///
/// A subscriber is registered under one or more event kinds. The bus only
/// hands it events of those kinds, but implementations must still treat any
/// other variant as a no-op and return `None`.
///
/// `handle` takes `&self`: subscribers that mutate state do so through a
/// handle injected at construction (e.g. a shared machine registry), and must
/// release any borrow of it before returning so cascades can re-enter.
pub trait Subscriber<E: Event> {
    /// Name used in logs and diagnostics.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    fn handle(&self, event: &E) -> Option<E>;
}

/// Subscriber handle as stored by the bus.
///
/// Identity is the allocation: two clones of the same `Rc` are the same
/// subscriber, two separately constructed values are not.
pub type SharedSubscriber<E> = Rc<dyn Subscriber<E>>;

/// Adapter turning a closure into a [`Subscriber`].
pub struct FnSubscriber<F> {
    name: &'static str,
    f: F,
}

impl<F> FnSubscriber<F> {
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> core::fmt::Debug for FnSubscriber<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnSubscriber").field("name", &self.name).finish()
    }
}

impl<E, F> Subscriber<E> for FnSubscriber<F>
where
    E: Event,
    F: Fn(&E) -> Option<E>,
{
    fn name(&self) -> &str {
        self.name
    }

    fn handle(&self, event: &E) -> Option<E> {
        (self.f)(event)
    }
}
