use anyhow::Result;
use std::time::Duration;

#[trait_variant::make(Transport: Send)]
pub trait UnsafeTransport: Clone + Send + Sync + 'static {
    // New will create a transport with no open connections, optionally routed through a proxy.
    #[allow(dead_code)]
    fn new(proxy_uri: Option<String>, timeout: Duration) -> Result<Self>;

    ///
    /// POST one encoded envelope to the collector.
    /// Returns the HTTP status code; the response body is never interpreted.
    /// Network failures (refused, DNS, timeout) are returned as errors.
    #[allow(dead_code)]
    async fn post(&self, url: String, body: Vec<u8>) -> Result<u16>;

    /// Returns the name of the transport protocol (e.g., "http")
    #[allow(dead_code)]
    fn name(&self) -> &'static str;
}
