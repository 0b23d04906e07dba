pub mod agent;
pub mod builder;
pub mod constants;
pub mod system;

// Re-export main types
pub use agent::AgentConfig;
pub use builder::{MessageIdentity, Settings, SettingsBuilder};
pub use constants::DEFAULT_SERVER_URL;

// Re-export for convenience
pub mod prelude {
    pub use crate::agent::AgentConfig;
    pub use crate::builder::{MessageIdentity, Settings, SettingsBuilder};
    pub use crate::constants::{
        CHANNEL_ID, CHANNEL_NAME, DEFAULT_SERVER_URL, MAX_IN_FLIGHT_LIMIT, NOTICE_ID,
        NOTICE_TEXT, NOTICE_TITLE, QUEUE_DEPTH_LIMIT,
    };
    pub use crate::system::get_system_proxy;
}
