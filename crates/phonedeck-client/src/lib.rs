//! Async client for the phonedeck control server.
//!
//! Three pieces, independent of each other:
//! - [`RequestClient`]: one-shot JSON requests (config, devices, apps,
//!   screenshot, synchronous run).
//! - [`StreamSession`]: launches a task run and consumes its push-event
//!   stream, keeping at most one connection alive.
//! - [`PollingScheduler`]: periodic screenshot refresh on a fixed cadence.
//!
//! # Example
//!
//! ```rust,no_run
//! use phonedeck_client::{RequestClient, StreamSession};
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RequestClient::new("http://127.0.0.1:5000");
//!     let mut session = StreamSession::new(&client);
//!
//!     let mut events = session.start("open settings and enable wifi")?;
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod poll;
pub mod stream;

pub use error::ClientError;
pub use http::RequestClient;
pub use poll::{FrameSource, PollingScheduler, SCREENSHOT_INTERVAL};
pub use stream::StreamSession;
