//! Event envelope shared by every producer.
//!
//! ```json
//! { "deviceId": "device_42", "type": "location", "payload": { "latitude": 37.0, ... } }
//! ```
//!
//! The crate is send-only: it serializes envelopes and never parses them back.

mod codec;
pub use codec::{encode, Envelope};
mod payload;
pub use payload::{EventKind, LocationPayload, MessagePayload, Payload};
