//! Events delivered by a task run stream.

/// A single event observed on a run's push stream, in delivery order.
///
/// The first four variants mirror the wire events (`message`, `result`,
/// `error`, `done`); the last two are transport-level signals from the
/// stream reader. Payloads are raw text and are not guaranteed to be JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The stream connection opened.
    Opened,
    /// Unnamed event: one plain log line.
    Line(String),
    /// `result` event: the agent's final answer for this run.
    Result(String),
    /// `error` event: an application-level error report. Does not end the run.
    Error(String),
    /// `done` event: the run finished; the server will send nothing further.
    Done,
    /// The stream is definitively closed without a `done` event.
    Closed(String),
    /// The transport hit a transient error and is retrying on its own.
    Retrying,
}

impl RunEvent {
    /// Returns true if no further events can follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Closed(_))
    }
}
