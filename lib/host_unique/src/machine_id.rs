use std::fs;

use crate::SerialSelector;

/// Reads the OS-provided machine id. Never writes.
#[derive(Default, serde::Serialize, serde::Deserialize)]
pub struct MachineId {
    #[serde(default)]
    path_override: Option<String>,
}

impl MachineId {
    pub fn new_with_file(path: impl Into<String>) -> Self {
        MachineId {
            path_override: Some(path.into()),
        }
    }

    fn candidates(&self) -> Vec<&str> {
        match &self.path_override {
            Some(path) => vec![path.as_str()],
            None => vec!["/etc/machine-id", "/var/lib/dbus/machine-id"],
        }
    }
}

impl SerialSelector for MachineId {
    fn get_name(&self) -> String {
        "machine_id".to_string()
    }

    fn get_serial(&self) -> Option<String> {
        for path in self.candidates() {
            match fs::read_to_string(path) {
                Ok(contents) if !contents.trim().is_empty() => {
                    return Some(contents.trim().to_string());
                }
                Ok(_) => {}
                Err(_err) => {
                    #[cfg(debug_assertions)]
                    log::debug!("failed to read machine id {}: {}", path, _err);
                }
            }
        }
        None
    }
}
