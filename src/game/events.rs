//! Edge-triggered world notifications
//!
//! Uses crossbeam-channel so the simulation never blocks on a slow consumer:
//! each subscriber gets a bounded queue and events that do not fit are dropped
//! and counted.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::Serialize;

use crate::game::state::AgentId;
use crate::game::stats::DeathStats;

/// Why an agent died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeathCause {
    /// Head touched another agent's body
    BodyCollision { killer: AgentId },
    /// Head left the map
    OutOfBounds,
}

/// Notification emitted at the end of a step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorldEvent {
    /// Player score went up during the step
    PlayerScored { score: u32 },
    /// Player kill count went up during the step
    PlayerKilledSomeone { kills: u32 },
    /// Player died; stats are final for this life
    PlayerDied { stats: DeathStats },
    /// Any agent died
    AgentDied { id: AgentId, cause: DeathCause },
    /// A dead bot was swapped for a fresh one
    BotReplaced { old: AgentId, new: AgentId },
}

/// Default per-subscriber queue length (several seconds of events at 60 Hz)
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Fan-out of world events to any number of subscribers
#[derive(Default)]
pub struct EventSink {
    subscribers: Vec<Sender<WorldEvent>>,
    dropped: u64,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber with its own bounded queue
    pub fn subscribe(&mut self, capacity: usize) -> EventReceiver {
        let (sender, receiver) = bounded(capacity.max(1));
        self.subscribers.push(sender);
        EventReceiver { receiver }
    }

    /// Deliver an event to every subscriber without blocking
    ///
    /// Full queues drop the event; disconnected subscribers are forgotten.
    pub fn publish(&mut self, event: WorldEvent) {
        let dropped = &mut self.dropped;
        self.subscribers.retain(|sender| match try_publish(sender, event.clone()) {
            Ok(()) => true,
            Err(EventSinkError::Full) => {
                *dropped += 1;
                true
            }
            Err(EventSinkError::Disconnected) => false,
        });
    }

    pub fn publish_all(&mut self, events: impl IntoIterator<Item = WorldEvent>) {
        for event in events {
            self.publish(event);
        }
    }

    /// Events lost to full queues since creation
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[inline]
fn try_publish(sender: &Sender<WorldEvent>, event: WorldEvent) -> Result<(), EventSinkError> {
    sender.try_send(event).map_err(|e| match e {
        TrySendError::Full(_) => EventSinkError::Full,
        TrySendError::Disconnected(_) => EventSinkError::Disconnected,
    })
}

/// Receiving end handed to a collaborator (audio, persistence, HUD)
pub struct EventReceiver {
    receiver: Receiver<WorldEvent>,
}

impl EventReceiver {
    /// Drain everything queued so far
    pub fn drain(&self) -> Vec<WorldEvent> {
        self.receiver.try_iter().collect()
    }

    /// Block until the next event; `None` once the simulation is gone
    pub fn recv(&self) -> Option<WorldEvent> {
        self.receiver.recv().ok()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Event delivery errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSinkError {
    /// Subscriber queue is full (backpressure)
    Full,
    /// Subscriber went away
    Disconnected,
}
