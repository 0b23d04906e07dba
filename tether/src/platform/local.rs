use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::{
    EventSink, LocationProvider, LocationRequest, LocationResult, MessageNotification,
    MessageSource, Subscription,
};

type LocationSinks = BTreeMap<u64, (LocationRequest, Arc<dyn EventSink<LocationResult>>)>;
type MessageSinks = BTreeMap<u64, Arc<dyn EventSink<MessageNotification>>>;

struct Registry {
    next_id: u64,
    location: LocationSinks,
    messages: MessageSinks,
    location_available: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Registry {
            next_id: 0,
            location: BTreeMap::new(),
            messages: BTreeMap::new(),
            location_available: true,
        }
    }
}

impl Registry {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/*
 * LocalPlatform is an in-process platform binding. Whatever produces events (the stdin feed in
 * the binary, tests) calls `deliver_*`, and every registered sink is invoked on the caller's
 * thread, the way a platform invokes callbacks on its own thread.
 */
#[derive(Default, Clone)]
pub struct LocalPlatform {
    registry: Arc<Mutex<Registry>>,
}

impl LocalPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the location source. While unavailable, fixes are dropped before reaching sinks.
    pub fn set_location_available(&self, available: bool) {
        lock(&self.registry).location_available = available;
    }

    /// Returns the number of sinks that received the result.
    pub fn deliver_location(&self, result: LocationResult) -> usize {
        let sinks: Vec<_> = {
            let registry = lock(&self.registry);
            if !registry.location_available {
                #[cfg(debug_assertions)]
                log::debug!("location source unavailable, dropping update");
                return 0;
            }
            registry
                .location
                .values()
                .map(|(_, sink)| sink.clone())
                .collect()
        };
        for sink in &sinks {
            sink.on_event(result.clone());
        }
        sinks.len()
    }

    /// Returns the number of sinks that received the notification.
    pub fn deliver_message(&self, notification: MessageNotification) -> usize {
        let sinks: Vec<_> = lock(&self.registry).messages.values().cloned().collect();
        for sink in &sinks {
            sink.on_event(notification.clone());
        }
        sinks.len()
    }

    pub fn location_subscriptions(&self) -> usize {
        lock(&self.registry).location.len()
    }

    pub fn message_subscriptions(&self) -> usize {
        lock(&self.registry).messages.len()
    }

    pub fn location_requests(&self) -> Vec<LocationRequest> {
        lock(&self.registry)
            .location
            .values()
            .map(|(request, _)| request.clone())
            .collect()
    }

    fn unregister(registry: Weak<Mutex<Registry>>, id: u64) -> impl FnOnce() + Send + 'static {
        move || {
            if let Some(registry) = registry.upgrade() {
                let mut registry = lock(&registry);
                registry.location.remove(&id);
                registry.messages.remove(&id);
            }
        }
    }
}

impl LocationProvider for LocalPlatform {
    fn request_updates(
        &self,
        request: LocationRequest,
        sink: Arc<dyn EventSink<LocationResult>>,
    ) -> Result<Subscription> {
        if request.fastest_interval > request.interval {
            return Err(anyhow!(
                "fastest interval {:?} exceeds interval {:?}",
                request.fastest_interval,
                request.interval
            ));
        }
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id();
            registry.location.insert(id, (request, sink));
            id
        };
        Ok(Subscription::new(Self::unregister(
            Arc::downgrade(&self.registry),
            id,
        )))
    }
}

impl MessageSource for LocalPlatform {
    fn subscribe(&self, sink: Arc<dyn EventSink<MessageNotification>>) -> Result<Subscription> {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id();
            registry.messages.insert(id, sink);
            id
        };
        Ok(Subscription::new(Self::unregister(
            Arc::downgrade(&self.registry),
            id,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Location, Priority};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl EventSink<LocationResult> for Counter {
        fn on_event(&self, _event: LocationResult) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl EventSink<MessageNotification> for Counter {
        fn on_event(&self, _event: MessageNotification) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request() -> LocationRequest {
        LocationRequest {
            interval: Duration::from_secs(5),
            fastest_interval: Duration::from_secs(3),
            priority: Priority::HighAccuracy,
        }
    }

    #[test]
    fn test_subscription_drop_unregisters() {
        let platform = LocalPlatform::new();
        let counter = Arc::new(Counter::default());

        let sub = platform.request_updates(request(), counter.clone()).unwrap();
        assert_eq!(platform.location_subscriptions(), 1);
        assert_eq!(
            platform.deliver_location(LocationResult::single(Location::new(1.0, 2.0, 3.0, 0.0))),
            1
        );

        sub.cancel();
        assert_eq!(platform.location_subscriptions(), 0);
        assert_eq!(platform.deliver_location(LocationResult::default()), 0);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unavailable_location_source_drops_updates() {
        let platform = LocalPlatform::new();
        let counter = Arc::new(Counter::default());
        let _sub = platform.request_updates(request(), counter.clone()).unwrap();

        platform.set_location_available(false);
        assert_eq!(platform.deliver_location(LocationResult::default()), 0);
        platform.set_location_available(true);
        assert_eq!(platform.deliver_location(LocationResult::default()), 1);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejects_inverted_intervals() {
        let platform = LocalPlatform::new();
        let mut bad = request();
        bad.fastest_interval = Duration::from_secs(10);
        assert!(platform
            .request_updates(bad, Arc::new(Counter::default()))
            .is_err());
    }

    #[test]
    fn test_message_subscriptions() {
        let platform = LocalPlatform::new();
        let counter = Arc::new(Counter::default());
        let sub = platform.subscribe(counter.clone()).unwrap();

        assert_eq!(platform.deliver_message(MessageNotification::default()), 1);
        drop(sub);
        assert_eq!(platform.message_subscriptions(), 0);
        assert_eq!(platform.deliver_message(MessageNotification::default()), 0);
    }
}
