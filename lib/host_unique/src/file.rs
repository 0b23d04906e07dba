use std::{fs, io::Write, path::Path};

use uuid::Uuid;

use crate::SerialSelector;

/// A serial persisted on disk, generated on first use.
#[derive(Default, serde::Serialize, serde::Deserialize)]
pub struct File {
    #[serde(default)]
    path_override: Option<String>,
}

impl File {
    pub fn new_with_file(path: impl Into<String>) -> Self {
        File {
            path_override: Some(path.into()),
        }
    }

    /*
     * Returns a predefined path to the serial file based on the current platform.
     */
    fn get_serial_path(&self) -> String {
        if let Some(override_path) = &self.path_override {
            return override_path.to_string();
        }

        #[cfg(target_os = "windows")]
        return String::from("C:\\ProgramData\\tether-serial");

        #[cfg(target_os = "macos")]
        return String::from("/Users/Shared/tether-serial");

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        return String::from("/var/lib/tether/serial");
    }
}

impl SerialSelector for File {
    fn get_name(&self) -> String {
        "file".to_string()
    }

    /*
     * Attempt to read a serial from a predefined path on disk.
     * If the file exists and is non-empty, its trimmed contents are the serial.
     * Otherwise a new serial is generated and written to the file.
     * If writing fails the generated serial is still returned, so it only lasts for this process.
     */
    fn get_serial(&self) -> Option<String> {
        let file_path = self.get_serial_path();
        let path = Path::new(file_path.as_str());

        match fs::read_to_string(path) {
            Ok(contents) if !contents.trim().is_empty() => {
                return Some(contents.trim().to_string());
            }
            Ok(_) => {}
            Err(_err) => {
                #[cfg(debug_assertions)]
                log::debug!("failed to read serial file {}: {}", file_path, _err);
            }
        }

        let serial = Uuid::new_v4().simple().to_string();

        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match fs::File::create(path) {
            Ok(mut f) => {
                if let Err(_err) = f.write_all(serial.as_bytes()) {
                    #[cfg(debug_assertions)]
                    log::debug!("failed to write serial file: {_err}");
                }
            }
            Err(_err) => {
                #[cfg(debug_assertions)]
                log::debug!("failed to create serial file: {_err}");
            }
        };

        Some(serial)
    }
}
