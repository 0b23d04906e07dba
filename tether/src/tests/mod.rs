mod interceptor_tests;
mod sampler_tests;

use anyhow::Result;
use config::{Settings, SettingsBuilder};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use transport::Transport;

use crate::liveness::{LivenessIndicator, LogIndicator};
use crate::platform::local::LocalPlatform;
use crate::platform::{Location, LocationResult};
use crate::supervisor::{Host, Supervisor};

pub(crate) const SERIAL: &str = "R58M123ABC";
pub(crate) const COLLECTOR: &str = "http://collector.example:4000";

/// Transport that records every POST instead of sending it.
#[derive(Clone, Default)]
pub(crate) struct RecordingTransport {
    posts: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    delay: Duration,
}

impl RecordingTransport {
    pub(crate) fn with_delay(delay: Duration) -> Self {
        RecordingTransport {
            delay,
            ..Default::default()
        }
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub(crate) fn bodies(&self) -> Vec<String> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, body)| String::from_utf8(body.clone()).unwrap())
            .collect()
    }

    pub(crate) fn decoded(&self) -> Vec<Value> {
        self.bodies()
            .iter()
            .map(|body| serde_json::from_str(body).unwrap())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn new(_proxy_uri: Option<String>, _timeout: Duration) -> Result<Self> {
        Ok(Self::default())
    }

    async fn post(&self, url: String, body: Vec<u8>) -> Result<u16> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.posts.lock().unwrap().push((url, body));
        Ok(200)
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub(crate) fn host(platform: &LocalPlatform, liveness: Arc<dyn LivenessIndicator>) -> Host {
    Host {
        location: Arc::new(platform.clone()),
        messages: Arc::new(platform.clone()),
        liveness,
        serial: SERIAL.to_string(),
    }
}

pub(crate) fn supervisor_with<T: Transport>(
    transport: T,
    settings: Settings,
) -> (Supervisor, LocalPlatform) {
    let platform = LocalPlatform::new();
    let supervisor = Supervisor::new(
        host(&platform, Arc::new(LogIndicator)),
        transport,
        settings,
        &Handle::current(),
    );
    (supervisor, platform)
}

pub(crate) fn recording_supervisor() -> (Supervisor, LocalPlatform, RecordingTransport) {
    let transport = RecordingTransport::default();
    let settings = SettingsBuilder::new().build().unwrap();
    let (supervisor, platform) = supervisor_with(transport.clone(), settings);
    (supervisor, platform, transport)
}

pub(crate) fn fix(latitude: f64, longitude: f64, accuracy: f64, speed: f64) -> LocationResult {
    LocationResult::single(Location::new(latitude, longitude, accuracy, speed))
}
