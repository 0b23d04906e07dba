macro_rules! server_url {
    () => {
        match option_env!("TETHER_SERVER_URL") {
            Some(url) => url,
            None => "http://127.0.0.1:4000",
        }
    };
}

/*
 * Compile-time constant for the collector base URL used on cold start, derived from the
 * TETHER_SERVER_URL environment variable during compilation.
 * Defaults to "http://127.0.0.1:4000" if this is unset.
 */
pub const DEFAULT_SERVER_URL: &str = server_url!();

/*
 * Compile-time constant for the agent proxy URI, derived from the TETHER_PROXY_URI environment variable during compilation.
 * Defaults to None if this is unset.
 */
macro_rules! proxy_uri {
    () => {
        option_env!("TETHER_PROXY_URI")
    };
}

macro_rules! queue_depth {
    () => {
        match option_env!("TETHER_QUEUE_DEPTH") {
            Some(depth) => depth,
            None => "256",
        }
    };
}
/* Compile-time constant for the number of encoded envelopes waiting for a sender, derived from
 * the TETHER_QUEUE_DEPTH environment variable during compilation.
 * Defaults to 256 if unset.
 */
pub const QUEUE_DEPTH: &str = queue_depth!();

macro_rules! max_in_flight {
    () => {
        match option_env!("TETHER_MAX_IN_FLIGHT") {
            Some(max) => max,
            None => "4",
        }
    };
}
/* Compile-time constant for the number of concurrent POSTs, derived from the
 * TETHER_MAX_IN_FLIGHT environment variable during compilation.
 * Defaults to 4 if unset.
 */
pub const MAX_IN_FLIGHT: &str = max_in_flight!();

// Upper bounds accepted for the queue settings. The shutdown drain acquires every
// in-flight permit in one call, so the in-flight bound must fit a u32.
pub const QUEUE_DEPTH_LIMIT: usize = 65_536;
pub const MAX_IN_FLIGHT_LIMIT: usize = 1_024;

// Location request cadence, in milliseconds.
pub const LOCATION_INTERVAL_MS: u64 = 5000;
pub const LOCATION_FASTEST_INTERVAL_MS: u64 = 3000;

// Per-request timeout for a single delivery, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

// Prefix prepended to the hardware serial on cold start.
pub const COLD_START_ID_PREFIX: &str = "device_";

// Liveness indicator identity.
pub const CHANNEL_ID: &str = "tracker_channel";
pub const CHANNEL_NAME: &str = "Tracker";
pub const NOTICE_ID: u32 = 1;
pub const NOTICE_TITLE: &str = "Tracker";
pub const NOTICE_TEXT: &str = "Tracking running";

// Compile-time check: the baked-in queue settings must be integers within their limits.
const _: () = {
    // Returns 0 for anything that isn't a decimal integer up to `limit`.
    const fn parse_bounded(s: &str, limit: usize) -> usize {
        // Can't use normal string ops in const fn.
        let bytes = s.as_bytes();
        if bytes.is_empty() {
            return 0;
        }
        let mut value: usize = 0;
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] < b'0' || bytes[i] > b'9' {
                return 0;
            }
            value = value * 10 + (bytes[i] - b'0') as usize;
            if value > limit {
                return 0;
            }
            i += 1;
        }
        value
    }

    if parse_bounded(QUEUE_DEPTH, QUEUE_DEPTH_LIMIT) == 0 {
        panic!("TETHER_QUEUE_DEPTH must be an integer between 1 and 65536");
    }
    if parse_bounded(MAX_IN_FLIGHT, MAX_IN_FLIGHT_LIMIT) == 0 {
        panic!("TETHER_MAX_IN_FLIGHT must be an integer between 1 and 1024");
    }
};

// Re-export proxy_uri macro for use in system module
pub(crate) use proxy_uri;
