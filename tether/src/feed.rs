/*
 * Newline-delimited JSON feed driving the local platform binding:
 *
 *   {"kind":"location","locations":[{"latitude":37.0,"longitude":-122.0,"accuracy":5.0,"speed":0.0}]}
 *   {"kind":"sms","format":"3gpp","fragments":[{"from":"+15551234567","body":"hello"}]}
 */
use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::platform::local::LocalPlatform;
use crate::platform::{LocationResult, MessageNotification};

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeedEvent {
    Location(LocationResult),
    Sms(MessageNotification),
}

/// Parse one line and hand it to the platform. Returns the number of sinks reached.
pub fn dispatch_line(platform: &LocalPlatform, line: &str) -> Result<usize> {
    let event: FeedEvent = serde_json::from_str(line).context("malformed feed line")?;
    let reached = match event {
        FeedEvent::Location(result) => platform.deliver_location(result),
        FeedEvent::Sms(notification) => platform.deliver_message(notification),
    };
    Ok(reached)
}

/// Read the feed until EOF. Bad lines are logged and skipped.
pub async fn pump<R>(reader: R, platform: LocalPlatform) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut dispatched = 0;
    while let Some(line) = lines.next_line().await.context("failed to read feed")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match dispatch_line(&platform, line) {
            Ok(_) => dispatched += 1,
            Err(err) => log::warn!("skipping feed line: {:#}", err),
        }
    }

    #[cfg(debug_assertions)]
    log::info!("feed closed after {} event(s)", dispatched);

    Ok(dispatched)
}
