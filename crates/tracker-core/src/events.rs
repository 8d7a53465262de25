// Change notifications for the collection.
//
// Handlers run synchronously, in subscription order, before `notify` returns.
// A panicking handler is logged and does not stop the remaining handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, error};
use tracker_models::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
    Imported,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Added => "added",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Imported => "imported",
        };
        write!(f, "{}", name)
    }
}

/// Emitted after every mutation, carrying the affected items as
/// they were right after the change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub items: Vec<Item>,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, items: Vec<Item>) -> Self {
        Self {
            kind,
            items,
            occurred_at: Utc::now(),
        }
    }

    pub fn single(kind: ChangeKind, item: Item) -> Self {
        Self::new(kind, vec![item])
    }
}

/// Returned by `subscribe`; pass back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

type ChangeHandler = Box<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
pub struct ChangeNotifier {
    handlers: Vec<(SubscriptionToken, ChangeHandler)>,
    next_token: u64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionToken
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.next_token += 1;
        let token = SubscriptionToken(self.next_token);
        self.handlers.push((token, Box::new(handler)));
        token
    }

    /// Returns false when the token was not (or no longer) subscribed.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(t, _)| *t != token);
        self.handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn notify(&self, event: &ChangeEvent) {
        debug!(
            "[EVENT] {} ({} items) | {} handlers",
            event.kind,
            event.items.len(),
            self.handlers.len()
        );

        for (idx, (_, handler)) in self.handlers.iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler(event)));
            if result.is_err() {
                error!("Change handler {} panicked while handling {} event", idx, event.kind);
            }
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let mut notifier = ChangeNotifier::new();
        let sequence = Arc::new(Mutex::new(Vec::new()));

        for n in 1..=3 {
            let seq = Arc::clone(&sequence);
            notifier.subscribe(move |_| seq.lock().unwrap().push(n));
        }

        notifier.notify(&ChangeEvent::new(ChangeKind::Imported, Vec::new()));
        assert_eq!(*sequence.lock().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut notifier = ChangeNotifier::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let token = notifier.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        notifier.notify(&ChangeEvent::new(ChangeKind::Updated, Vec::new()));

        assert!(notifier.unsubscribe(token));
        assert!(!notifier.unsubscribe(token));
        notifier.notify(&ChangeEvent::new(ChangeKind::Updated, Vec::new()));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_panicking_handler_does_not_block_others() {
        let mut notifier = ChangeNotifier::new();
        let counter = Arc::new(AtomicUsize::new(0));

        notifier.subscribe(|_| panic!("Intentional panic"));
        let counter_clone = Arc::clone(&counter);
        notifier.subscribe(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        notifier.notify(&ChangeEvent::new(ChangeKind::Deleted, Vec::new()));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
