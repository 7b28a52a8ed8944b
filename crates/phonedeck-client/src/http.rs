//! One-shot JSON client for the control server's REST endpoints.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use phonedeck_core::{ConfigPatch, ConsoleConfig, DeviceInfo, ScreenshotFrame};

use crate::error::ClientError;

/// JSON client for the control server.
///
/// Every response body is parsed as JSON regardless of HTTP status; the
/// server signals application failure through an `error` field (or an
/// `ok: false` acknowledgment), never through the status code alone.
/// Network failure surfaces as [`ClientError::Transport`].
#[derive(Debug, Clone)]
pub struct RequestClient {
    inner: reqwest::Client,
    base_url: String,
}

impl RequestClient {
    /// Create a client for the given server base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The server base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying HTTP client, shared with the stream session.
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET request");

        let response = self.inner.get(&url).send().await?;
        decode(response.json::<Value>().await?)
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST request");

        let response = self.inner.post(&url).json(body).send().await?;
        decode(response.json::<Value>().await?)
    }

    /// Read the server's stored agent configuration.
    pub async fn config(&self) -> Result<ConsoleConfig, ClientError> {
        self.get_json("/api/config").await
    }

    /// Merge a partial update into the server configuration. Returns the
    /// full configuration after the merge.
    pub async fn update_config(&self, patch: &ConfigPatch) -> Result<ConsoleConfig, ClientError> {
        if patch.is_empty() {
            return Err(ClientError::Validation(
                "no configuration fields to update".to_string(),
            ));
        }
        let ack: ConfigAck = self.post_json("/api/config", patch).await?;
        Ok(ack.config)
    }

    /// List devices known to the server's device bridge.
    pub async fn devices(&self) -> Result<Vec<DeviceInfo>, ClientError> {
        let listing: DeviceListing = self.get_json("/api/devices").await?;
        Ok(listing.devices)
    }

    /// Connect the device bridge to a network address.
    pub async fn connect_device(&self, address: &str) -> Result<String, ClientError> {
        if address.trim().is_empty() {
            return Err(ClientError::Validation("address is required".to_string()));
        }
        let ack: Ack = self
            .post_json("/api/connect", &AddressBody { address: Some(address) })
            .await?;
        ack.into_message()
    }

    /// Disconnect the device bridge, from one address or from all.
    pub async fn disconnect_device(&self, address: Option<&str>) -> Result<String, ClientError> {
        let ack: Ack = self
            .post_json("/api/disconnect", &AddressBody { address })
            .await?;
        ack.into_message()
    }

    /// List applications the agent knows how to drive.
    pub async fn apps(&self) -> Result<Vec<String>, ClientError> {
        let listing: AppListing = self.get_json("/api/apps").await?;
        Ok(listing.apps)
    }

    /// Fetch one screenshot frame from the current device.
    pub async fn screenshot(&self) -> Result<ScreenshotFrame, ClientError> {
        let shot: Screenshot = self.get_json("/api/screenshot").await?;
        Ok(ScreenshotFrame {
            image: shot.image,
            width: shot.width,
            height: shot.height,
            is_sensitive: shot.is_sensitive,
            current_app: shot.current_app,
            captured_at: Utc::now(),
        })
    }

    /// Run a task synchronously, without streaming. Blocks until the agent
    /// finishes and returns its final answer.
    pub async fn run_once(&self, task: &str) -> Result<String, ClientError> {
        if task.trim().is_empty() {
            return Err(ClientError::Validation(
                "task description is required".to_string(),
            ));
        }
        let outcome: RunOutcome = self.post_json("/api/run", &TaskBody { task }).await?;
        if outcome.ok {
            Ok(outcome.result.unwrap_or_default())
        } else {
            Err(ClientError::Application(
                outcome.message.unwrap_or_else(|| "run failed".to_string()),
            ))
        }
    }
}

/// Decode a parsed JSON body into `T`, surfacing a payload-level `error`
/// field as [`ClientError::Application`] first.
fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(ClientError::Application(error.to_string()));
    }
    serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct ConfigAck {
    #[allow(dead_code)]
    ok: bool,
    config: ConsoleConfig,
}

#[derive(Debug, Deserialize)]
struct DeviceListing {
    #[serde(default)]
    devices: Vec<DeviceInfo>,
}

#[derive(Debug, Deserialize)]
struct AppListing {
    #[serde(default)]
    apps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Screenshot {
    image: String,
    width: u32,
    height: u32,
    #[serde(default)]
    is_sensitive: bool,
    #[serde(default)]
    current_app: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Ack {
    ok: bool,
    #[serde(default)]
    message: Option<String>,
}

impl Ack {
    fn into_message(self) -> Result<String, ClientError> {
        let message = self.message.unwrap_or_default();
        if self.ok {
            Ok(message)
        } else {
            Err(ClientError::Application(message))
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunOutcome {
    ok: bool,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddressBody<'a> {
    address: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct TaskBody<'a> {
    task: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_surfaces_payload_error_field() {
        let err = decode::<DeviceListing>(json!({"devices": [], "error": "adb not found"}))
            .unwrap_err();
        match err {
            ClientError::Application(msg) => assert_eq!(msg, "adb not found"),
            other => panic!("expected Application, got {other:?}"),
        }
    }

    #[test]
    fn decode_accepts_clean_payload() {
        let listing: DeviceListing = decode(json!({
            "devices": [{"device_id": "emulator-5554", "status": "device"}]
        }))
        .unwrap();
        assert_eq!(listing.devices.len(), 1);
        assert_eq!(listing.devices[0].device_id, "emulator-5554");
    }

    #[test]
    fn decode_reports_shape_mismatch() {
        let err = decode::<Screenshot>(json!({"image": "data:...", "width": "wide"})).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn ack_with_ok_false_is_application_error() {
        let ack = Ack {
            ok: false,
            message: Some("address is required".into()),
        };
        let err = ack.into_message().unwrap_err();
        assert!(err.is_application());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = RequestClient::new("http://127.0.0.1:5000/");
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
    }

    #[tokio::test]
    async fn empty_inputs_are_rejected_before_any_request() {
        // Unroutable base URL: a network attempt would error differently.
        let client = RequestClient::new("http://127.0.0.1:9");
        assert!(matches!(
            client.connect_device("  ").await,
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            client.run_once("").await,
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            client.update_config(&ConfigPatch::default()).await,
            Err(ClientError::Validation(_))
        ));
    }
}
