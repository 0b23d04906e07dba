use crate::constants::proxy_uri;

/*
 * Returns the proxy the delivery client should use, if any.
 * A compile-time TETHER_PROXY_URI wins over the process environment.
 */
pub fn get_system_proxy() -> Option<String> {
    let proxy_uri_compile_time_override = proxy_uri!();
    if let Some(proxy_uri) = proxy_uri_compile_time_override {
        return Some(proxy_uri.to_string());
    }

    #[cfg(unix)]
    {
        for key in ["http_proxy", "https_proxy"] {
            match std::env::var(key) {
                Ok(val) if !val.is_empty() => return Some(val),
                Ok(_) => {}
                Err(_e) => {
                    #[cfg(debug_assertions)]
                    log::debug!("Didn't find {} env var: {}", key, _e);
                }
            }
        }
        None
    }
    #[cfg(not(unix))]
    {
        None
    }
}
