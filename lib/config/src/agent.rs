use anyhow::{anyhow, Result};
use std::fmt;

use crate::constants::{COLD_START_ID_PREFIX, DEFAULT_SERVER_URL};

/// Identity and destination of one agent run.
///
/// A snapshot is built for every start request and never mutated afterwards; producers hold
/// it behind an `Arc` for as long as they run.
#[derive(Clone, PartialEq, Eq)]
pub struct AgentConfig {
    device_id: String,
    server_url: String,
}

impl AgentConfig {
    pub fn new(device_id: impl Into<String>, server_url: impl Into<String>) -> Result<Self> {
        let device_id = device_id.into();
        let server_url = server_url.into();
        if device_id.trim().is_empty() {
            return Err(anyhow!("device id must not be empty"));
        }
        if server_url.trim().is_empty() {
            return Err(anyhow!("server url must not be empty"));
        }
        Ok(AgentConfig {
            device_id,
            server_url,
        })
    }

    /*
     * Configuration used when the agent is launched by the boot hook: the device id is derived
     * from the hardware serial and the collector is the compiled-in default.
     */
    pub fn cold_start(serial: &str) -> Result<Self> {
        Self::new(
            format!("{}{}", COLD_START_ID_PREFIX, serial),
            DEFAULT_SERVER_URL,
        )
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("device_id", &self.device_id)
            .field("server_url", &self.server_url)
            .finish()
    }
}
