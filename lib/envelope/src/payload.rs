use serde::Serialize;
use std::fmt;

/// Discriminator carried in the envelope's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Location,
    Sms,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Location => write!(f, "location"),
            EventKind::Sms => write!(f, "sms"),
        }
    }
}

/// A single position fix.
///
/// `accuracy` and `speed` are `None` when the platform reported a non-finite or negative value;
/// they are then encoded as JSON `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub speed: Option<f64>,
}

impl LocationPayload {
    /// Returns `None` when the coordinates do not describe a fix.
    pub fn new(latitude: f64, longitude: f64, accuracy: f64, speed: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        Some(LocationPayload {
            latitude,
            longitude,
            accuracy: non_negative(accuracy),
            speed: non_negative(speed),
        })
    }
}

fn non_negative(value: f64) -> Option<f64> {
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// One inbound text-message fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePayload {
    pub from: String,
    pub text: String,
}

impl MessagePayload {
    pub fn new(from: Option<String>, text: Option<String>) -> Self {
        MessagePayload {
            from: from.unwrap_or_default(),
            text: text.unwrap_or_default(),
        }
    }
}

/// Type-specific body of an envelope. The variant decides the envelope's `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Location(LocationPayload),
    Message(MessagePayload),
}

impl Payload {
    pub fn kind(&self) -> EventKind {
        match self {
            Payload::Location(_) => EventKind::Location,
            Payload::Message(_) => EventKind::Sms,
        }
    }
}

impl From<LocationPayload> for Payload {
    fn from(p: LocationPayload) -> Self {
        Payload::Location(p)
    }
}

impl From<MessagePayload> for Payload {
    fn from(p: MessagePayload) -> Self {
        Payload::Message(p)
    }
}
