//! Topic-based event bus implementation.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::SkillEvent;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Started / Completed / Failed / Interrupted
    Lifecycle,
    /// Cooldown expiry
    Cooldown,
}

/// Handle returned by [`EventBus::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct Subscription {
    topic: Topic,
    id: u64,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

type Observer = Box<dyn FnMut(&SkillEvent) + Send>;

/// Topic-based event bus
///
/// Observers run synchronously inside `publish`, in subscription order. The
/// bus also keeps a bounded history of the most recent events.
pub struct EventBus {
    observers: HashMap<Topic, Vec<(u64, Observer)>>,
    next_id: u64,
    history: VecDeque<SkillEvent>,
    history_capacity: usize,
}

impl EventBus {
    /// Creates a bus that remembers the last 256 events.
    pub fn new() -> Self {
        Self::with_history(256)
    }

    /// Creates a bus that remembers the last `capacity` events (0 keeps none).
    pub fn with_history(capacity: usize) -> Self {
        Self {
            observers: HashMap::new(),
            next_id: 0,
            history: VecDeque::with_capacity(capacity.min(1024)),
            history_capacity: capacity,
        }
    }

    /// Registers `observer` for every event published on `topic`.
    pub fn subscribe(
        &mut self,
        topic: Topic,
        observer: impl FnMut(&SkillEvent) + Send + 'static,
    ) -> Subscription {
        self.next_id += 1;
        let id = self.next_id;
        self.observers
            .entry(topic)
            .or_default()
            .push((id, Box::new(observer)));
        Subscription { topic, id }
    }

    /// Removes an observer. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let Some(observers) = self.observers.get_mut(&subscription.topic) else {
            return false;
        };
        let before = observers.len();
        observers.retain(|(id, _)| *id != subscription.id);
        observers.len() != before
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&mut self, event: SkillEvent) {
        let topic = event.topic();
        match self.observers.get_mut(&topic) {
            Some(observers) if !observers.is_empty() => {
                for (_, observer) in observers.iter_mut() {
                    observer(&event);
                }
            }
            _ => tracing::trace!("No subscribers for topic {:?}", topic),
        }

        if self.history_capacity == 0 {
            return;
        }
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.observers.get(&topic).map_or(0, Vec::len)
    }

    /// Retained events, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &SkillEvent> + '_ {
        self.history.iter()
    }

    /// Takes the retained events, oldest first, leaving the history empty.
    pub fn drain_history(&mut self) -> Vec<SkillEvent> {
        self.history.drain(..).collect()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers: usize = self.observers.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("subscribers", &subscribers)
            .field("history", &self.history.len())
            .field("history_capacity", &self.history_capacity)
            .finish()
    }
}
