use crate::Transport;
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

static JSON_CONTENT_TYPE: &str = "application/json";

#[allow(clippy::upper_case_acronyms)]
#[derive(Clone)]
pub struct HTTP {
    client: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for HTTP {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HTTP")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Transport for HTTP {
    fn new(proxy_uri: Option<String>, timeout: Duration) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        // Proxy selection is owned by the settings layer, not reqwest's env lookup
        match proxy_uri {
            Some(proxy) => {
                #[cfg(debug_assertions)]
                log::debug!("routing deliveries through proxy {}", proxy);

                let proxy = reqwest::Proxy::all(proxy.as_str())
                    .with_context(|| format!("invalid proxy uri '{}'", proxy))?;
                builder = builder.proxy(proxy);
            }
            None => builder = builder.no_proxy(),
        }
        let client = builder.build().context("failed to build http client")?;
        Ok(HTTP { client, timeout })
    }

    async fn post(&self, url: String, body: Vec<u8>) -> Result<u16> {
        let response = self
            .client
            .post(url.as_str())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;

        Ok(response.status().as_u16())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
