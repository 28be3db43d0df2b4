//! Event publishing port.

use std::future::Future;
use std::sync::Arc;

use rfhub_domain::error::HubError;
use rfhub_domain::event::Event;

/// Sink for domain events.
///
/// Integrations publish [`StateChanged`](rfhub_domain::event::EventType::StateChanged)
/// after each successful command; the registry publishes creation events.
pub trait EventPublisher {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T> EventPublisher for Arc<T>
where
    T: EventPublisher + Send + Sync,
{
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), HubError>> + Send {
        T::publish(self, event)
    }
}
