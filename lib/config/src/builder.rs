use anyhow::{anyhow, Result};
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    LOCATION_FASTEST_INTERVAL_MS, LOCATION_INTERVAL_MS, MAX_IN_FLIGHT, MAX_IN_FLIGHT_LIMIT,
    QUEUE_DEPTH, QUEUE_DEPTH_LIMIT, REQUEST_TIMEOUT_SECS,
};
use crate::system::get_system_proxy;

/// Which identifier message envelopes carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageIdentity {
    /// The raw hardware serial, independent of the configured device id.
    #[default]
    Hardware,
    /// The device id from the active `AgentConfig`.
    Configured,
}

impl FromStr for MessageIdentity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hardware" => Ok(MessageIdentity::Hardware),
            "configured" => Ok(MessageIdentity::Configured),
            other => Err(anyhow!("unknown message identity '{}'", other)),
        }
    }
}

/// Process-wide tuning that stays fixed across start requests.
#[derive(Debug, Clone)]
pub struct Settings {
    pub location_interval: Duration,
    pub location_fastest_interval: Duration,
    pub queue_depth: usize,
    pub max_in_flight: usize,
    pub request_timeout: Duration,
    pub proxy_uri: Option<String>,
    pub message_identity: MessageIdentity,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            location_interval: Duration::from_millis(LOCATION_INTERVAL_MS),
            location_fastest_interval: Duration::from_millis(LOCATION_FASTEST_INTERVAL_MS),
            // Both are validated at compile time in constants.rs
            queue_depth: QUEUE_DEPTH.parse().unwrap_or(256),
            max_in_flight: MAX_IN_FLIGHT.parse().unwrap_or(4),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            proxy_uri: get_system_proxy(),
            message_identity: MessageIdentity::default(),
        }
    }
}

/// Runtime overrides applied on top of the compiled-in defaults.
#[derive(Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.settings.queue_depth = depth;
        self
    }

    pub fn max_in_flight(mut self, max: usize) -> Self {
        self.settings.max_in_flight = max;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.settings.request_timeout = timeout;
        self
    }

    pub fn proxy_uri(mut self, proxy: Option<String>) -> Self {
        self.settings.proxy_uri = proxy;
        self
    }

    pub fn message_identity(mut self, identity: MessageIdentity) -> Self {
        self.settings.message_identity = identity;
        self
    }

    pub fn build(self) -> Result<Settings> {
        if !(1..=QUEUE_DEPTH_LIMIT).contains(&self.settings.queue_depth) {
            return Err(anyhow!(
                "queue depth must be between 1 and {}, got {}",
                QUEUE_DEPTH_LIMIT,
                self.settings.queue_depth
            ));
        }
        if !(1..=MAX_IN_FLIGHT_LIMIT).contains(&self.settings.max_in_flight) {
            return Err(anyhow!(
                "max in-flight deliveries must be between 1 and {}, got {}",
                MAX_IN_FLIGHT_LIMIT,
                self.settings.max_in_flight
            ));
        }
        Ok(self.settings)
    }
}
