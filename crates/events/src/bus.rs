//! Subscription registry + fan-out.
//!
//! The bus is synchronous and single-threaded: `publish` calls every
//! subscriber of the event's kind on the caller's stack and hands back the
//! follow-up events they produced. Driving those follow-ups to exhaustion is
//! the [`Dispatcher`](crate::Dispatcher)'s job.
//!
//! ## Guarantees
//!
//! - **Set semantics**: a subscriber is registered at most once per kind
//! - **No dedup of cascades**: every follow-up from every subscriber is returned
//! - **No ordering contract** among subscribers of the same kind
//! - **Unknown kinds are dropped**: publishing with no subscribers is not an error

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use tracing::trace;

use crate::{Event, SharedSubscriber, Subscriber};

fn same_subscriber<A, B>(a: &Rc<A>, b: &Rc<B>) -> bool
where
    A: ?Sized,
    B: ?Sized,
{
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// In-process pub/sub bus keyed by event kind.
pub struct EventBus<E: Event> {
    subscriptions: HashMap<E::Kind, Vec<SharedSubscriber<E>>>,
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` under `kind`.
    ///
    /// Returns `false` (and changes nothing) if it was already registered there.
    pub fn subscribe(&mut self, kind: E::Kind, subscriber: SharedSubscriber<E>) -> bool {
        let subs = self.subscriptions.entry(kind).or_default();
        if subs.iter().any(|s| same_subscriber(s, &subscriber)) {
            return false;
        }
        trace!(%kind, subscriber = subscriber.name(), "subscribed");
        subs.push(subscriber);
        true
    }

    /// Remove `subscriber` from `kind`.
    ///
    /// Returns `false` if it was not registered there (including kinds that
    /// were never subscribed at all).
    pub fn unsubscribe<S>(&mut self, kind: E::Kind, subscriber: &Rc<S>) -> bool
    where
        S: Subscriber<E> + ?Sized,
    {
        let Some(subs) = self.subscriptions.get_mut(&kind) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|s| !same_subscriber(s, subscriber));
        let removed = subs.len() != before;
        if subs.is_empty() {
            self.subscriptions.remove(&kind);
        }
        if removed {
            trace!(%kind, subscriber = subscriber.name(), "unsubscribed");
        }
        removed
    }

    pub fn is_subscribed<S>(&self, kind: E::Kind, subscriber: &Rc<S>) -> bool
    where
        S: Subscriber<E> + ?Sized,
    {
        self.subscribers(kind)
            .iter()
            .any(|s| same_subscriber(s, subscriber))
    }

    /// Current subscribers of `kind` (empty if none).
    pub fn subscribers(&self, kind: E::Kind) -> &[SharedSubscriber<E>] {
        self.subscriptions
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of subscribers per kind, sorted by kind. Kinds without
    /// subscribers are omitted.
    pub fn subscription_counts(&self) -> Vec<(E::Kind, usize)> {
        let mut counts: Vec<_> = self
            .subscriptions
            .iter()
            .map(|(kind, subs)| (*kind, subs.len()))
            .collect();
        counts.sort_by_key(|(kind, _)| *kind);
        counts
    }

    pub fn total_subscriptions(&self) -> usize {
        self.subscriptions.values().map(Vec::len).sum()
    }

    /// Deliver `event` to every subscriber of its kind, passing each follow-up
    /// to `emit` as soon as it is produced.
    ///
    /// Returns the number of subscribers invoked.
    pub fn publish_with(&self, event: &E, mut emit: impl FnMut(E)) -> usize {
        let subs = self.subscribers(event.kind());
        if subs.is_empty() {
            trace!(event_type = event.event_type(), "no subscribers; dropped");
            return 0;
        }
        for sub in subs {
            if let Some(follow_up) = sub.handle(event) {
                trace!(
                    subscriber = sub.name(),
                    from = event.event_type(),
                    to = follow_up.event_type(),
                    "cascade"
                );
                emit(follow_up);
            }
        }
        subs.len()
    }

    /// Deliver `event` and collect the follow-ups.
    pub fn publish(&self, event: &E) -> Vec<E> {
        let mut follow_ups = Vec::new();
        self.publish_with(event, |e| follow_ups.push(e));
        follow_ups
    }

    /// Deliver `event`, appending follow-ups to a caller-owned pending queue.
    ///
    /// Returns the number of follow-ups appended.
    pub fn publish_into(&self, event: &E, pending: &mut VecDeque<E>) -> usize {
        let before = pending.len();
        self.publish_with(event, |e| pending.push_back(e));
        pending.len() - before
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            subscriptions: HashMap::new(),
        }
    }
}

impl<E: Event> core::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscription_counts())
            .finish()
    }
}
