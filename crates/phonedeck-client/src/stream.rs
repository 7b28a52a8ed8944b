//! Live run monitoring over a server-push event stream.

use std::sync::{Arc, Mutex, PoisonError};

use futures::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use phonedeck_core::{RunEvent, RunState, TaskRun};

use crate::error::ClientError;
use crate::http::RequestClient;

/// Manages the single live run stream.
///
/// At most one connection is ever alive: [`StreamSession::start`] replaces
/// the previous run inside one `&mut self` call, aborting its reader before
/// the new connection opens. A superseded reader's events can only reach
/// that run's own log, which is discarded with it.
///
/// There is no explicit stop. A run ends by supersession, a `done` event,
/// a terminal transport failure, or dropping the session.
pub struct StreamSession {
    client: reqwest::Client,
    base_url: String,
    active: Option<ActiveRun>,
}

struct ActiveRun {
    run: Arc<Mutex<TaskRun>>,
    reader: JoinHandle<()>,
}

impl StreamSession {
    /// Create a session against the same server as `client`.
    pub fn new(client: &RequestClient) -> Self {
        Self {
            client: client.http().clone(),
            base_url: client.base_url().to_string(),
            active: None,
        }
    }

    /// Start a new run for the given task description.
    ///
    /// Fails pre-flight with [`ClientError::Validation`] on an empty
    /// description; no network activity happens in that case. Any live run
    /// is closed immediately, without waiting for the server.
    ///
    /// Returns a receiver yielding the run's events in arrival order. The
    /// channel closes after a terminal event or when the run is superseded.
    pub fn start(
        &mut self,
        description: &str,
    ) -> Result<mpsc::UnboundedReceiver<RunEvent>, ClientError> {
        if description.trim().is_empty() {
            return Err(ClientError::Validation(
                "task description is required".to_string(),
            ));
        }

        // Replace-and-close: the prior connection dies with its reader.
        if let Some(prev) = self.active.take() {
            debug!("superseding live run");
            prev.reader.abort();
        }

        let url = format!("{}/api/run_stream", self.base_url);
        let request = self.client.get(&url).query(&[("task", description)]);
        let source = EventSource::new(request)
            .map_err(|e| ClientError::StreamClosed(e.to_string()))?;

        let run = Arc::new(Mutex::new(TaskRun::new(description)));
        let (tx, rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_stream(source, Arc::clone(&run), tx));
        self.active = Some(ActiveRun { run, reader });
        Ok(rx)
    }

    /// Current run state; `Idle` when no run has been started.
    pub fn state(&self) -> RunState {
        self.active
            .as_ref()
            .map(|a| lock(&a.run).state)
            .unwrap_or_default()
    }

    /// Rendered log of the current run.
    pub fn log_text(&self) -> String {
        self.active
            .as_ref()
            .map(|a| lock(&a.run).render())
            .unwrap_or_default()
    }

    /// True while a reader still owns a connection. After a `done` event or
    /// a terminal transport failure this returns false and a new `start`
    /// may begin immediately.
    pub fn is_live(&self) -> bool {
        self.active
            .as_ref()
            .map(|a| !a.reader.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.reader.abort();
        }
    }
}

fn lock(run: &Mutex<TaskRun>) -> std::sync::MutexGuard<'_, TaskRun> {
    run.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pump stream events into the run until a terminal event arrives.
///
/// Transient transport errors are mapped to [`RunEvent::Retrying`] and the
/// event source keeps reconnecting on its own; only a definitively closed
/// stream fails the run.
async fn read_stream(
    mut source: EventSource,
    run: Arc<Mutex<TaskRun>>,
    tx: mpsc::UnboundedSender<RunEvent>,
) {
    while let Some(item) = source.next().await {
        let event = match item {
            Ok(Event::Open) => RunEvent::Opened,
            Ok(Event::Message(message)) => match message.event.as_str() {
                "result" => RunEvent::Result(message.data),
                "error" => RunEvent::Error(message.data),
                "done" => RunEvent::Done,
                _ => RunEvent::Line(message.data),
            },
            Err(err) => classify_stream_error(err),
        };

        let terminal = event.is_terminal();
        if let RunEvent::Closed(reason) = &event {
            warn!(reason = %reason, "run stream closed");
        }
        lock(&run).apply(event.clone());
        // Receiver may have been dropped; the run log is still maintained.
        let _ = tx.send(event);

        if terminal {
            source.close();
            break;
        }
    }
}

fn classify_stream_error(err: reqwest_eventsource::Error) -> RunEvent {
    use reqwest_eventsource::Error;

    match err {
        Error::StreamEnded => RunEvent::Closed("stream ended".to_string()),
        Error::InvalidStatusCode(status, _) => RunEvent::Closed(format!("HTTP {}", status)),
        Error::InvalidContentType(_, _) => {
            RunEvent::Closed("response is not an event stream".to_string())
        }
        // Transport blips and parse hiccups: the source retries by itself.
        other => {
            debug!(error = %other, "stream error, transport will retry");
            RunEvent::Retrying
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn session() -> StreamSession {
        // Unroutable port: connection attempts fail fast and the reader
        // sits in the transport's retry loop.
        StreamSession::new(&RequestClient::new("http://127.0.0.1:9"))
    }

    #[tokio::test]
    async fn empty_description_is_rejected_without_a_run() {
        let mut session = session();
        let err = session.start("   ").unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(session.state(), RunState::Idle);
        assert!(!session.is_live());
    }

    #[tokio::test]
    async fn starting_again_supersedes_the_previous_run() {
        let mut session = session();
        let mut first = session.start("first task").unwrap();
        let _second = session.start("second task").unwrap();

        // The superseded reader was aborted: its channel drains any buffered
        // transport signals and then closes. Nothing from it reaches the new
        // run's log.
        while let Some(event) = first.recv().await {
            assert!(matches!(event, RunEvent::Retrying));
        }
        assert_eq!(session.log_text(), "");
        assert!(session.is_live());
    }

    /// Serves `404 Not Found` to every connection so the event source
    /// closes definitively instead of retrying.
    fn spawn_not_found_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n");
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn terminal_failure_fails_the_run_and_permits_restart() {
        let base = spawn_not_found_server();
        let mut session = StreamSession::new(&RequestClient::new(&base));

        let mut events = session.start("first task").unwrap();
        loop {
            match events.recv().await {
                Some(RunEvent::Closed(reason)) => {
                    assert!(reason.contains("404"));
                    break;
                }
                Some(_) => {}
                None => panic!("stream ended without a terminal event"),
            }
        }

        // Reader done: channel closed, handle cleared, run failed.
        assert!(events.recv().await.is_none());
        assert_eq!(session.state(), RunState::Failed);
        assert!(!session.is_live());

        // A terminal state permits an immediate new start.
        let _second = session.start("second task").unwrap();
        assert!(session.is_live());
    }

    #[tokio::test]
    async fn session_tracks_only_the_latest_run() {
        let mut session = session();
        let _rx = session.start("a task").unwrap();
        assert!(session.is_live());
        assert_eq!(session.state(), RunState::Idle);
    }
}
