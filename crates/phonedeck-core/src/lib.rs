//! Phonedeck Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Async runtime specifics
//!
//! All types here represent the core domain of the phonedeck console:
//! the state of a streamed task run, the last-known device screenshot,
//! device descriptions, and the agent configuration mirrored from the
//! control server.

pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod run;
pub mod screenshot;
pub mod status;

// Re-export commonly used types
pub use config::{ConfigPatch, ConsoleConfig, DeviceKind};
pub use device::DeviceInfo;
pub use error::CoreError;
pub use event::RunEvent;
pub use run::{LogBlock, TaskRun};
pub use screenshot::ScreenshotFrame;
pub use status::RunState;
