//! Device inventory
//!
//! The inventory lists the microphones, displays and sources installed in the
//! room, in the order the panel presents them. Join assignment follows that
//! order, so reordering the inventory renumbers the generated signals.

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

use super::error::ContractError;

/// A configured device (microphone, display or source)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Device {
    /// Stable identifier used by the UI (e.g. "mic-1")
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Optional icon reference, passed through to the view layer
    #[serde(default)]
    pub icon: Option<String>,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: None,
        }
    }
}

/// Volume range and defaults for microphones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioLimits {
    pub min_volume: i32,
    pub max_volume: i32,
    /// Volume change applied by a single up/down press
    pub step: i32,
    /// Volume assumed for a microphone before any feedback arrives
    pub default_volume: i32,
}

impl Default for AudioLimits {
    fn default() -> Self {
        Self {
            min_volume: 0,
            max_volume: 100,
            step: 5,
            default_volume: 45,
        }
    }
}

impl AudioLimits {
    /// Clamp a volume into the configured range
    pub fn clamp(&self, volume: i32) -> i32 {
        volume.clamp(self.min_volume, self.max_volume)
    }

    /// Default volume, clamped into range
    pub fn initial_volume(&self) -> i32 {
        self.clamp(self.default_volume)
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), ContractError> {
        if self.min_volume > self.max_volume || self.step <= 0 {
            return Err(ContractError::InvalidAudioLimits {
                min: self.min_volume,
                max: self.max_volume,
                step: self.step,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AudioSection {
    #[serde(flatten)]
    limits: AudioLimits,
    microphones: Vec<Device>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct VideoSection {
    displays: Vec<Device>,
    sources: Vec<Device>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct InventoryDocument {
    audio: AudioSection,
    video: VideoSection,
}

/// Devices installed in the room
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInventory {
    pub microphones: Vec<Device>,
    pub displays: Vec<Device>,
    pub sources: Vec<Device>,
    pub audio: AudioLimits,
}

impl DeviceInventory {
    /// Create an empty inventory with default audio limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the panel configuration document
    ///
    /// ```json
    /// { "audio": { "minVolume": 0, "maxVolume": 100, "step": 5, "defaultVolume": 45,
    ///              "microphones": [{ "id": "mic-1", "name": "Wireless Mic A" }] },
    ///   "video": { "displays": [...], "sources": [...] } }
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: InventoryDocument = serde_json::from_str(json)?;
        Ok(Self {
            microphones: doc.audio.microphones,
            displays: doc.video.displays,
            sources: doc.video.sources,
            audio: doc.audio.limits,
        })
    }

    /// Read and parse the panel configuration document from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Add a microphone
    pub fn microphone(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.microphones.push(Device::new(id, name));
        self
    }

    /// Add a display
    pub fn display(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.displays.push(Device::new(id, name));
        self
    }

    /// Add a video source
    pub fn source(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.sources.push(Device::new(id, name));
        self
    }

    /// Set the audio limits
    pub fn audio_limits(mut self, limits: AudioLimits) -> Self {
        self.audio = limits;
        self
    }

    /// Check ids and limits before generating a contract
    pub fn validate(&self) -> std::result::Result<(), ContractError> {
        self.audio.validate()?;
        check_ids("microphone", &self.microphones)?;
        check_ids("display", &self.displays)?;
        check_ids("source", &self.sources)?;
        Ok(())
    }
}

fn check_ids(class: &'static str, devices: &[Device]) -> std::result::Result<(), ContractError> {
    let mut seen = std::collections::HashSet::with_capacity(devices.len());
    for (index, device) in devices.iter().enumerate() {
        if device.id.trim().is_empty() {
            return Err(ContractError::EmptyDeviceId { class, index });
        }
        if !seen.insert(device.id.as_str()) {
            return Err(ContractError::DuplicateDevice {
                class,
                id: device.id.clone(),
            });
        }
    }
    Ok(())
}
