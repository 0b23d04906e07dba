/*
 * The host only lets a background agent keep running while it shows a visible indicator.
 * The supervisor registers a channel and shows a notice on every start, and withdraws it on stop.
 */
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use config::prelude::{CHANNEL_ID, CHANNEL_NAME, NOTICE_ID, NOTICE_TEXT, NOTICE_TITLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    Low,
    Default,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
}

impl Default for Channel {
    fn default() -> Self {
        Channel {
            id: CHANNEL_ID.to_string(),
            name: CHANNEL_NAME.to_string(),
            importance: Importance::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u32,
    pub channel_id: String,
    pub title: String,
    pub text: String,
}

impl Default for Notice {
    fn default() -> Self {
        Notice {
            id: NOTICE_ID,
            channel_id: CHANNEL_ID.to_string(),
            title: NOTICE_TITLE.to_string(),
            text: NOTICE_TEXT.to_string(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait LivenessIndicator: Send + Sync {
    /// Create (or update) the named channel notices are posted to. Must be idempotent.
    fn register_channel(&self, channel: &Channel) -> Result<()>;

    /// Display or replace the persistent notice.
    fn show(&self, notice: &Notice) -> Result<()>;

    fn withdraw(&self, notice_id: u32);
}

/*
 * StatusFile publishes the notice as a small status file other tools (or a person) can read.
 * Registering the channel creates the parent directory; failing to write is a start failure.
 */
#[derive(Debug, Clone)]
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StatusFile { path: path.into() }
    }

    /// `<tmp>/tether.status` unless a path is configured.
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("tether.status")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LivenessIndicator for StatusFile {
    fn register_channel(&self, channel: &Channel) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create channel '{}' at {}",
                    channel.id,
                    parent.display()
                )
            })?;
        }
        Ok(())
    }

    fn show(&self, notice: &Notice) -> Result<()> {
        let contents = format!(
            "{}: {}\nchannel={}\nnotice={}\npid={}\n",
            notice.title,
            notice.text,
            notice.channel_id,
            notice.id,
            std::process::id()
        );
        fs::write(&self.path, contents)
            .with_context(|| format!("failed to write status file {}", self.path.display()))
    }

    fn withdraw(&self, _notice_id: u32) {
        if let Err(_err) = fs::remove_file(&self.path) {
            #[cfg(debug_assertions)]
            log::debug!("failed to remove status file: {_err}");
        }
    }
}

/// Indicator for hosts with no visible surface beyond the process log.
#[derive(Debug, Default, Clone)]
pub struct LogIndicator;

impl LivenessIndicator for LogIndicator {
    fn register_channel(&self, channel: &Channel) -> Result<()> {
        log::info!("liveness channel {} ({:?})", channel.id, channel.importance);
        Ok(())
    }

    fn show(&self, notice: &Notice) -> Result<()> {
        log::info!("{}: {}", notice.title, notice.text);
        Ok(())
    }

    fn withdraw(&self, notice_id: u32) {
        log::info!("liveness notice {} withdrawn", notice_id);
    }
}
