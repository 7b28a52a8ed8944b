//! Agent configuration mirrored from the control server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Device bridge used by the control server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Android Debug Bridge.
    #[default]
    Adb,
    /// HarmonyOS Device Connector.
    Hdc,
}

impl FromStr for DeviceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adb" => Ok(Self::Adb),
            "hdc" => Ok(Self::Hdc),
            other => Err(CoreError::UnknownDeviceKind(other.to_string())),
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adb => write!(f, "adb"),
            Self::Hdc => write!(f, "hdc"),
        }
    }
}

/// The server-side agent configuration, as stored in its config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Model endpoint base URL.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Model API key.
    pub api_key: String,
    /// Which device bridge to drive.
    pub device_type: DeviceKind,
    /// Target device, if pinned.
    #[serde(default)]
    pub device_id: Option<String>,
    /// Maximum agent steps per task.
    pub max_steps: u32,
    /// Prompt language.
    pub lang: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/v1".to_string(),
            model: "autoglm-phone-9b".to_string(),
            api_key: "EMPTY".to_string(),
            device_type: DeviceKind::Adb,
            device_id: None,
            max_steps: 100,
            lang: "cn".to_string(),
        }
    }
}

/// A partial configuration update. Only set fields are sent; the server
/// merges them into its stored configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<DeviceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl ConfigPatch {
    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
