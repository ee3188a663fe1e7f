use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

use super::events::SessionEvent;

/// topic -> subscriber id -> channel
type Topics = HashMap<String, HashMap<u64, mpsc::UnboundedSender<SessionEvent>>>;

#[derive(Debug, Default)]
struct BusState {
    topics: Topics,
    next_subscriber_id: u64,
}

fn lock_state(state: &Mutex<BusState>) -> MutexGuard<'_, BusState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Topic-keyed publish/subscribe bus
///
/// Topics are created by their first subscriber and removed when the last
/// one goes away. Each subscriber owns an unbounded FIFO queue, so publishing
/// never waits on a slow reader.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    state: Arc<Mutex<BusState>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        lock_state(&self.state)
    }

    /// Registers a new subscriber on `topic`.
    ///
    /// Only events published after this call are observed. Dropping the
    /// returned subscription unregisters it.
    pub fn subscribe(&self, topic: &str) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut state = self.lock();
        let id = state.next_subscriber_id;
        state.next_subscriber_id += 1;

        let subscribers = state.topics.entry(topic.to_string()).or_insert_with(|| {
            debug!(topic = %topic, "Creating topic for first subscriber");
            HashMap::new()
        });
        subscribers.insert(id, sender);

        debug!(
            topic = %topic,
            subscriber_id = id,
            subscribers = subscribers.len(),
            "Subscribed to topic"
        );

        Subscription {
            topic: topic.to_string(),
            id,
            receiver,
            bus: Arc::downgrade(&self.state),
        }
    }

    /// Enqueues `event` for every current subscriber of `topic` and returns
    /// how many received it. Publishing to a topic nobody listens on is a no-op.
    pub fn publish(&self, topic: &str, event: SessionEvent) -> usize {
        let state = self.lock();

        let Some(subscribers) = state.topics.get(topic) else {
            debug!(topic = %topic, event = event.event_type(), "Event published with no subscribers");
            return 0;
        };

        let delivered = subscribers
            .values()
            .filter(|sender| sender.send(event.clone()).is_ok())
            .count();

        debug!(
            topic = %topic,
            event = event.event_type(),
            receivers = delivered,
            "Event published"
        );
        delivered
    }

    /// Removes `topic` entirely; streams of its remaining subscribers end
    /// once they drain what is already queued. Returns the number of
    /// subscribers that were detached.
    pub fn close_topic(&self, topic: &str) -> usize {
        let detached = self
            .lock()
            .topics
            .remove(topic)
            .map_or(0, |subscribers| subscribers.len());

        if detached > 0 {
            debug!(topic = %topic, detached, "Topic closed with live subscribers");
        }
        detached
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock().topics.get(topic).map_or(0, HashMap::len)
    }

    pub fn topic_count(&self) -> usize {
        self.lock().topics.len()
    }
}

/// A live registration on one topic
///
/// Implements [`Stream`]: it yields events in publish order and suspends
/// until the next one arrives. The stream only ends if the topic is closed.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    id: u64,
    receiver: mpsc::UnboundedReceiver<SessionEvent>,
    bus: Weak<Mutex<BusState>>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next event on this topic.
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }
}

impl Stream for Subscription {
    type Item = SessionEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        let mut state = lock_state(&bus);

        if let Some(subscribers) = state.topics.get_mut(&self.topic) {
            subscribers.remove(&self.id);
            if subscribers.is_empty() {
                state.topics.remove(&self.topic);
                debug!(topic = %self.topic, "Last subscriber left, topic removed");
            }
        }

        debug!(topic = %self.topic, subscriber_id = self.id, "Unsubscribed from topic");
    }
}
