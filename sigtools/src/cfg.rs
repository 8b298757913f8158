//! Configuration tools: the bridge's startup file and descriptor template

use serde::{Serialize, Deserialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, SUBFRAMES_PER_FRAME};

/// Bridge settings, loaded from one JSON file before any loop starts.
///
/// A minimal file names the telemetry server endpoint and the descriptor
/// template; everything else has defaults. The `trigger` block decides
/// what the bridge can do: when present the bridge runs the control
/// dispatcher and reports trigger times in every frame, when absent it
/// is a plain streaming bridge and inbound control payloads are ignored.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Bridge {
    /// Telemetry server endpoint, `host:port`
    pub addr:       String,
    /// Path of the descriptor template file
    pub descriptor: PathBuf,
    /// Ticks aggregated into one frame
    #[serde(default = "subframes")]
    pub subframes:  usize,
    /// Trigger hardware, if attached
    #[serde(default)]
    pub trigger:    Option<Trigger>,
}

/// Serial trigger box settings
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Trigger {
    /// Serial device path or name
    pub port:       String,
    #[serde(default = "baud")]
    pub baud:       u32,
    /// Settle interval between the writes of one pulse, in ms
    #[serde(default = "settle")]
    pub settle_ms:  u64,
}

fn subframes() -> usize {
    SUBFRAMES_PER_FRAME
}

fn baud() -> u32 {
    9600
}

fn settle() -> u64 {
    10
}

/// Creates a triggerless localhost bridge
impl Default for Bridge {
    fn default() -> Self {
        Bridge {
            addr:       "127.0.0.1:8124".to_string(),
            descriptor: PathBuf::from("device-descriptor.json"),
            subframes:  SUBFRAMES_PER_FRAME,
            trigger:    None,
        }
    }
}

/// Load and validate the bridge configuration. Any problem here is fatal;
/// the bridge never starts half-configured.
pub fn load(path: &Path) -> Result<Bridge, Error> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read config {}: {}", path.display(), e)))?;
    let bridge: Bridge = serde_json::from_str(&text)
        .map_err(|e| Error::Config(format!("bad config {}: {}", path.display(), e)))?;
    if bridge.subframes == 0 {
        return Err(Error::Config("subframes must be nonzero".into()));
    }
    Ok(bridge)
}

/// Load the static descriptor template. Registration is all-or-nothing,
/// so a missing or non-object template is fatal before anything is sent.
pub fn load_template(path: &Path) -> Result<Value, Error> {
    let text = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read template {}: {}", path.display(), e)))?;
    let template: Value = serde_json::from_str(&text)
        .map_err(|e| Error::Config(format!("bad template {}: {}", path.display(), e)))?;
    if !template.is_object() {
        return Err(Error::Config(format!(
            "template {} must be a JSON object",
            path.display()
        )));
    }
    Ok(template)
}
