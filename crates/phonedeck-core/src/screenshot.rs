//! Last-known device screenshot.

use chrono::{DateTime, Utc};

/// The last successfully fetched display snapshot.
///
/// Replaced wholesale on every fetch; frames are never merged or diffed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotFrame {
    /// Image payload as a `data:image/png;base64,...` URL.
    pub image: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Whether the device flagged the screen as sensitive content.
    pub is_sensitive: bool,
    /// Foreground application label, if the device reports one.
    pub current_app: Option<String>,
    /// When this frame was fetched.
    pub captured_at: DateTime<Utc>,
}

impl ScreenshotFrame {
    /// Human-readable `WxH` dimensions.
    pub fn dimensions(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}
