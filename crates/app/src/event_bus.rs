//! Broadcast-backed [`EventPublisher`].

use tokio::sync::broadcast;

use rfhub_domain::error::HubError;
use rfhub_domain::event::Event;

use crate::ports::EventPublisher;

/// Fans every published event out to all live subscribers.
///
/// Subscribers only see events published after they subscribed. A subscriber
/// that falls more than `capacity` events behind skips the oldest ones.
/// Publishing never fails, even without subscribers.
#[derive(Debug, Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::Sender::new(capacity),
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for InProcessEventBus {
    async fn publish(&self, event: Event) -> Result<(), HubError> {
        let event_type = event.event_type;
        match self.sender.send(event) {
            Ok(receivers) => tracing::trace!(?event_type, receivers, "event published"),
            Err(_) => tracing::trace!(?event_type, "event dropped, no subscriber"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    use super::*;
    use rfhub_domain::event::EventType;

    fn event(event_type: EventType) -> Event {
        Event::new(event_type, None, serde_json::json!({}))
    }

    #[tokio::test]
    async fn should_fan_out_to_every_subscriber() {
        let bus = InProcessEventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.clone().subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let published = event(EventType::StateChanged);
        bus.publish(published.clone()).await.unwrap();

        assert_eq!(first.recv().await.unwrap(), published);
        assert_eq!(second.recv().await.unwrap(), published);
    }

    #[tokio::test]
    async fn should_not_replay_past_events_to_late_subscriber() {
        let bus = InProcessEventBus::new(8);
        bus.publish(event(EventType::DeviceRegistered)).await.unwrap();

        let mut late = bus.subscribe();

        assert!(matches!(late.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn should_skip_oldest_events_for_slow_subscriber() {
        let bus = InProcessEventBus::new(2);
        let mut slow = bus.subscribe();
        for _ in 0..3 {
            bus.publish(event(EventType::StateChanged)).await.unwrap();
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(1))));
    }
}
