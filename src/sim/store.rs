//! Subscribe/notify wrapper around [`SimulationState`]
//!
//! Listeners are keyed by field (or `Topic::Any`) and run synchronously,
//! in registration order, right after an update that changed something.

use super::state::{Field, FieldChange, SimulationState};
use crate::clamp_percent;

/// Subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Field(Field),
    Any,
}

impl Topic {
    fn matches(&self, changes: &[FieldChange]) -> bool {
        match self {
            Topic::Any => !changes.is_empty(),
            Topic::Field(field) => changes.iter().any(|c| c.field == *field),
        }
    }
}

/// Handle returned by [`StateStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&SimulationState, &[FieldChange])>;

struct Subscription {
    id: SubscriptionId,
    topic: Topic,
    listener: Listener,
}

/// Owns the state; every write goes through [`StateStore::update`]
pub struct StateStore {
    state: SimulationState,
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl StateStore {
    pub fn new(state: SimulationState) -> Self {
        Self {
            state,
            subscriptions: Vec::new(),
            next_id: 1,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Register a listener; it receives the full state and all changed fields
    pub fn subscribe<F>(&mut self, topic: Topic, listener: F) -> SubscriptionId
    where
        F: FnMut(&SimulationState, &[FieldChange]) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            topic,
            listener: Box::new(listener),
        });
        id
    }

    /// Returns false if the id was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Apply a mutation, re-clamp fill levels, then notify matching listeners.
    ///
    /// Returns the changed fields (empty for a no-op write).
    pub fn update<F>(&mut self, mutate: F) -> Vec<FieldChange>
    where
        F: FnOnce(&mut SimulationState),
    {
        let old = self.state.clone();
        mutate(&mut self.state);
        self.state.fill_level = clamp_percent(self.state.fill_level);
        self.state.mug_fill_level = clamp_percent(self.state.mug_fill_level);

        let changes = self.state.diff(&old);
        if changes.is_empty() {
            return changes;
        }
        for sub in self.subscriptions.iter_mut() {
            if sub.topic.matches(&changes) {
                (sub.listener)(&self.state, &changes);
            }
        }
        changes
    }
}
