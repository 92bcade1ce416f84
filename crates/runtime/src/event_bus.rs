/// Handle returned by [`EventBus::subscribe`], used to unsubscribe later.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

type Handler<T> = Box<dyn FnMut(&T)>;

/// Typed, single-threaded publish/subscribe channel.
///
/// Subscribers run synchronously inside [`EventBus::emit`], in subscription
/// order, so every subscriber observes every event exactly once.
pub struct EventBus<T> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Handler<T>)>,
    emitted: u64,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
            emitted: 0,
        }
    }
}

impl<T> std::fmt::Debug for EventBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("emitted", &self.emitted)
            .finish()
    }
}

impl<T> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn emit(&mut self, event: &T) {
        self.emitted += 1;
        for (_, handler) in &mut self.subscribers {
            handler(event);
        }
    }

    /// Total number of events emitted over the bus lifetime.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn every_subscriber_sees_every_event() {
        let seen_a = Rc::new(RefCell::new(Vec::new()));
        let seen_b = Rc::new(RefCell::new(Vec::new()));

        let mut bus = EventBus::new();
        let a = Rc::clone(&seen_a);
        bus.subscribe(move |v: &u32| a.borrow_mut().push(*v));
        let b = Rc::clone(&seen_b);
        bus.subscribe(move |v: &u32| b.borrow_mut().push(*v * 10));

        bus.emit(&1);
        bus.emit(&2);

        assert_eq!(*seen_a.borrow(), vec![1, 2]);
        assert_eq!(*seen_b.borrow(), vec![10, 20]);
        assert_eq!(bus.emitted(), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery_and_is_idempotent() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let c = Rc::clone(&count);
        let id = bus.subscribe(move |_: &()| *c.borrow_mut() += 1);

        bus.emit(&());
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&());

        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
