//! Device descriptions returned by the device list endpoint.

use serde::{Deserialize, Serialize};

/// One device known to the control server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device identifier (serial or network address).
    pub device_id: String,

    /// Raw status string as reported by the device bridge.
    #[serde(default)]
    pub status: String,

    /// Connection type (e.g. "usb", "wifi"), if known.
    #[serde(default)]
    pub connection_type: Option<String>,

    /// Device model name, if known.
    #[serde(default)]
    pub model: Option<String>,
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.device_id,
            self.connection_type.as_deref().unwrap_or("-"),
            self.status
        )?;
        if let Some(model) = &self.model {
            write!(f, " - {}", model)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_with_missing_optional_fields() {
        let device: DeviceInfo =
            serde_json::from_str(r#"{"device_id": "emulator-5554", "status": "device"}"#).unwrap();
        assert_eq!(device.device_id, "emulator-5554");
        assert_eq!(device.connection_type, None);
        assert_eq!(device.to_string(), "emulator-5554 [-] device");
    }

    #[test]
    fn display_includes_model_when_present() {
        let device = DeviceInfo {
            device_id: "192.168.1.20:5555".into(),
            status: "device".into(),
            connection_type: Some("wifi".into()),
            model: Some("Pixel 8".into()),
        };
        assert_eq!(device.to_string(), "192.168.1.20:5555 [wifi] device - Pixel 8");
    }
}
