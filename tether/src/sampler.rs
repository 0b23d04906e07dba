use config::AgentConfig;
use envelope::{LocationPayload, Payload};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use transport::DeliveryClient;

use crate::platform::{EventSink, LocationProvider, LocationRequest, LocationResult, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Stopped,
    Subscribing,
    Active,
}

/*
 * LocationSampler subscribes to the platform location source and forwards one `location`
 * envelope per delivered update. The config snapshot it was built with is used for every
 * envelope until the sampler is dropped.
 */
pub struct LocationSampler {
    request: LocationRequest,
    state: SamplerState,
    subscription: Option<Subscription>,
    sink: Arc<LocationSink>,
}

impl LocationSampler {
    pub fn new(config: Arc<AgentConfig>, delivery: DeliveryClient, request: LocationRequest) -> Self {
        LocationSampler {
            request,
            state: SamplerState::Stopped,
            subscription: None,
            sink: Arc::new(LocationSink {
                config,
                delivery,
                forwarded: AtomicU64::new(0),
                skipped: AtomicU64::new(0),
            }),
        }
    }

    pub fn start(&mut self, provider: &dyn LocationProvider) {
        if self.state == SamplerState::Active {
            return;
        }
        self.state = SamplerState::Subscribing;

        let sink: Arc<dyn EventSink<LocationResult>> = self.sink.clone();
        match provider.request_updates(self.request.clone(), sink) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.state = SamplerState::Active;
                log::info!(
                    "location updates requested (interval={:?}, fastest={:?}, priority={:?})",
                    self.request.interval,
                    self.request.fastest_interval,
                    self.request.priority
                );
            }
            Err(err) => {
                // No retry: the sampler stays quiet until the next start request
                log::warn!("location source unavailable: {:#}", err);
                self.state = SamplerState::Stopped;
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            #[cfg(debug_assertions)]
            log::info!("location updates removed");
        }
        self.state = SamplerState::Stopped;
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn config(&self) -> &AgentConfig {
        &self.sink.config
    }

    /// Number of envelopes handed to the delivery client.
    pub fn forwarded(&self) -> u64 {
        self.sink.forwarded.load(Ordering::Relaxed)
    }

    /// Number of updates dropped because they carried no usable fix.
    pub fn skipped(&self) -> u64 {
        self.sink.skipped.load(Ordering::Relaxed)
    }
}

struct LocationSink {
    config: Arc<AgentConfig>,
    delivery: DeliveryClient,
    forwarded: AtomicU64,
    skipped: AtomicU64,
}

impl LocationSink {
    fn skip(&self, _reason: &str) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        #[cfg(debug_assertions)]
        log::debug!("skipping location update: {}", _reason);
    }
}

impl EventSink<LocationResult> for LocationSink {
    fn on_event(&self, result: LocationResult) {
        // Only the most recent fix of a batch is forwarded
        let Some(location) = result.last_location() else {
            self.skip("no location in result");
            return;
        };
        let Some(payload) = LocationPayload::new(
            location.latitude.unwrap_or(f64::NAN),
            location.longitude.unwrap_or(f64::NAN),
            location.accuracy.unwrap_or(f64::NAN),
            location.speed.unwrap_or(f64::NAN),
        ) else {
            self.skip("missing coordinates");
            return;
        };

        let payload = Payload::from(payload);
        match envelope::encode(self.config.device_id(), &payload) {
            Ok(body) => {
                self.delivery.send(self.config.server_url(), body);
                self.forwarded.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                log::error!("failed to encode location envelope: {:#}", err);
            }
        }
    }
}

impl Drop for LocationSampler {
    fn drop(&mut self) {
        self.stop();
    }
}
