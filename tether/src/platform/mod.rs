/*
 * Seams between the agent and the host platform.
 *
 * The platform owns its callback threads; producers implement `EventSink` and are handed to a
 * provider, which calls `on_event` for every delivered event until the returned `Subscription`
 * is dropped.
 */
use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub mod local;

pub trait EventSink<E>: Send + Sync {
    fn on_event(&self, event: E);
}

/// Live registration with a platform event source. Dropping it unregisters the sink.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(self) {
        drop(self)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    HighAccuracy,
    BalancedPowerAccuracy,
    LowPower,
    Passive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationRequest {
    pub interval: Duration,
    pub fastest_interval: Duration,
    pub priority: Priority,
}

/// A position as reported by the platform. Any field may be missing on a malformed update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, speed: f64) -> Self {
        Location {
            latitude: Some(latitude),
            longitude: Some(longitude),
            accuracy: Some(accuracy),
            speed: Some(speed),
        }
    }
}

/// One location callback; the platform may batch several fixes, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocationResult {
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl LocationResult {
    pub fn single(location: Location) -> Self {
        LocationResult {
            locations: vec![location],
        }
    }

    pub fn last_location(&self) -> Option<&Location> {
        self.locations.last()
    }
}

/// A decoded fragment (PDU) of an inbound text message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageFragment {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl MessageFragment {
    pub fn new(from: &str, body: &str) -> Self {
        MessageFragment {
            from: Some(from.to_string()),
            body: Some(body.to_string()),
        }
    }
}

/// One inbound-message broadcast; multipart messages arrive as several fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageNotification {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub fragments: Vec<MessageFragment>,
}

pub trait LocationProvider: Send + Sync {
    fn request_updates(
        &self,
        request: LocationRequest,
        sink: Arc<dyn EventSink<LocationResult>>,
    ) -> Result<Subscription>;
}

pub trait MessageSource: Send + Sync {
    fn subscribe(&self, sink: Arc<dyn EventSink<MessageNotification>>) -> Result<Subscription>;
}
