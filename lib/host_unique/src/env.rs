use std::env;

use crate::SerialSelector;

const DEFAULT_VAR: &str = "TETHER_DEVICE_SERIAL";

/// Reads the serial from an environment variable (`TETHER_DEVICE_SERIAL` unless overridden).
#[derive(Default, serde::Serialize, serde::Deserialize)]
pub struct Env {
    #[serde(default)]
    var: Option<String>,
}

impl Env {
    pub fn with_var(var: impl Into<String>) -> Self {
        Env {
            var: Some(var.into()),
        }
    }
}

impl SerialSelector for Env {
    fn get_name(&self) -> String {
        "env".to_string()
    }

    fn get_serial(&self) -> Option<String> {
        let var = self.var.as_deref().unwrap_or(DEFAULT_VAR);
        match env::var(var) {
            Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
            Ok(_) => None,
            Err(_err) => {
                #[cfg(debug_assertions)]
                log::debug!("{} not usable as device serial: {:?}", var, _err);
                None
            }
        }
    }
}
