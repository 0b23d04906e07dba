use anyhow::{Context, Result};

mod env;
pub use env::Env;
mod file;
pub use file::File;
mod machine_id;
pub use machine_id::MachineId;

/// Serial reported when no selector produced one.
pub const UNKNOWN_SERIAL: &str = "unknown";

pub trait SerialSelector {
    fn get_name(&self) -> String;
    fn get_serial(&self) -> Option<String>;
}

/// Describes a single serial source as encoded in `TETHER_SERIAL_SOURCES` or `--serial-sources`.
///
/// The JSON representation is internally tagged with `type`; the remaining keys are the
/// selector's own fields:
///
/// ```json
/// [
///   {"type": "env", "var": "ANDROID_SERIAL"},
///   {"type": "machine_id"},
///   {"type": "file", "path_override": "/data/tether/serial"}
/// ]
/// ```
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum SelectorSpec {
    #[serde(rename = "env")]
    Env(Env),
    #[serde(rename = "file")]
    File(File),
    #[serde(rename = "machine_id")]
    MachineId(MachineId),
}

impl SelectorSpec {
    /// Convert this entry into a boxed [`SerialSelector`].
    pub fn into_selector(self) -> Box<dyn SerialSelector> {
        match self {
            SelectorSpec::Env(s) => Box::new(s),
            SelectorSpec::File(s) => Box::new(s),
            SelectorSpec::MachineId(s) => Box::new(s),
        }
    }
}

// Iterate through all available serial selectors in order and return the first serial found.
pub fn get_serial_with_selectors(selectors: Vec<Box<dyn SerialSelector>>) -> String {
    for selector in selectors {
        match selector.get_serial() {
            Some(res) => {
                #[cfg(debug_assertions)]
                log::debug!("device serial provided by {} selector", selector.get_name());
                return res;
            }
            None => {
                #[cfg(debug_assertions)]
                log::debug!("Serial selector {} failed", selector.get_name());
            }
        }
    }

    UNKNOWN_SERIAL.to_string()
}

/// Parse a JSON selector list.
pub fn from_json(json: &str) -> Result<Vec<Box<dyn SerialSelector>>> {
    let specs: Vec<SelectorSpec> =
        serde_json::from_str(json).context("invalid serial selector list")?;
    Ok(specs.into_iter().map(SelectorSpec::into_selector).collect())
}

/// The selector list baked in at build time through `TETHER_SERIAL_SOURCES`, if any.
pub fn from_build_env() -> Option<Vec<Box<dyn SerialSelector>>> {
    let json = option_env!("TETHER_SERIAL_SOURCES")?;
    match from_json(json) {
        Ok(selectors) => Some(selectors),
        Err(_err) => {
            #[cfg(debug_assertions)]
            log::error!("ignoring baked-in serial sources: {_err:#}");
            None
        }
    }
}

// Return the default list of serial selectors to evaluate
// List is evaluated in order and will take the first successful
// result.
pub fn defaults() -> Vec<Box<dyn SerialSelector>> {
    vec![
        Box::<Env>::default(),
        #[cfg(any(
            target_os = "linux",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd"
        ))]
        Box::<MachineId>::default(),
        Box::<File>::default(),
    ]
}

/// Resolve the device serial: explicit JSON, then the build-time list, then [`defaults`].
pub fn device_serial(sources_json: Option<&str>) -> Result<String> {
    let selectors = match sources_json {
        Some(json) => from_json(json)?,
        None => from_build_env().unwrap_or_else(defaults),
    };
    Ok(get_serial_with_selectors(selectors))
}
