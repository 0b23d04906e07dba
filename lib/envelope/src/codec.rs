use anyhow::{Context, Result};
use serde::Serialize;

use crate::payload::{EventKind, Payload};

/// The wire wrapper sent for every observed event.
///
/// Field order on the wire is `deviceId`, `type`, `payload`.
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    #[serde(rename = "deviceId")]
    device_id: &'a str,
    #[serde(rename = "type")]
    kind: EventKind,
    payload: &'a Payload,
}

impl<'a> Envelope<'a> {
    pub fn new(device_id: &'a str, payload: &'a Payload) -> Self {
        Envelope {
            device_id,
            kind: payload.kind(),
            payload,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).context("failed to serialize envelope")
    }
}

/*
 * Serialize one event for the collector as UTF-8 JSON.
 * The envelope type always matches the payload variant.
 */
pub fn encode(device_id: &str, payload: &Payload) -> Result<Vec<u8>> {
    Envelope::new(device_id, payload).to_bytes()
}
