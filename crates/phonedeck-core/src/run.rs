//! The task run: an append-only log plus a state machine.

use crate::event::RunEvent;
use crate::status::RunState;

/// One rendered block of a run's log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogBlock {
    /// A plain output line.
    Line(String),
    /// The agent's final answer, rendered inside a RESULT marker.
    Result(String),
    /// An application-level error report, rendered inside an ERROR marker.
    Error(String),
    /// Terminal marker appended when the run completes.
    Done,
}

impl LogBlock {
    /// Render this block alone, marker included. A run's full log is the
    /// concatenation of its blocks rendered this way.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Self::Line(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Self::Result(text) => {
                out.push_str("\n=== RESULT ===\n");
                out.push_str(text);
                out.push('\n');
            }
            Self::Error(text) => {
                out.push_str("\n=== ERROR ===\n");
                out.push_str(text);
                out.push('\n');
            }
            Self::Done => out.push_str("\n=== DONE ===\n"),
        }
    }
}

/// The single in-flight task run.
///
/// Events are applied strictly in arrival order through [`TaskRun::apply`];
/// the log is append-only and never reordered or deduplicated. The stream
/// transport lives elsewhere, so this type is testable in isolation.
#[derive(Debug, Clone)]
pub struct TaskRun {
    /// Free-text task description given at start.
    pub description: String,
    /// Current lifecycle state.
    pub state: RunState,
    /// Accumulated log, in arrival order.
    pub log: Vec<LogBlock>,
}

impl TaskRun {
    /// Create a run for the given task description. Starts `Idle`; the
    /// stream reader moves it to `Running` with [`RunEvent::Opened`].
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            state: RunState::Idle,
            log: Vec::new(),
        }
    }

    /// Apply one stream event.
    ///
    /// This is the only place run state and log mutate. A transient
    /// `Retrying` signal changes nothing; an `Error` event is log content,
    /// not a terminal condition.
    pub fn apply(&mut self, event: RunEvent) {
        match event {
            RunEvent::Opened => {
                if self.state == RunState::Idle {
                    self.state = RunState::Running;
                }
            }
            RunEvent::Line(text) => self.log.push(LogBlock::Line(text)),
            RunEvent::Result(text) => self.log.push(LogBlock::Result(text)),
            RunEvent::Error(text) => self.log.push(LogBlock::Error(text)),
            RunEvent::Done => {
                self.log.push(LogBlock::Done);
                self.state = RunState::Completed;
            }
            RunEvent::Closed(_) => self.state = RunState::Failed,
            RunEvent::Retrying => {}
        }
    }

    /// Render the log exactly as it accumulated, marker blocks included.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for block in &self.log {
            block.render_into(&mut out);
        }
        out
    }

    /// Returns true while the run has not reached a terminal state.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(events: Vec<RunEvent>) -> TaskRun {
        let mut run = TaskRun::new("open settings");
        for event in events {
            run.apply(event);
        }
        run
    }

    #[test]
    fn events_render_in_arrival_order_with_markers() {
        let run = run_with(vec![
            RunEvent::Opened,
            RunEvent::Line("step 1".into()),
            RunEvent::Result("ok".into()),
            RunEvent::Error("tap failed".into()),
            RunEvent::Line("step 2".into()),
            RunEvent::Done,
        ]);

        assert_eq!(
            run.render(),
            "step 1\n\
             \n=== RESULT ===\nok\n\
             \n=== ERROR ===\ntap failed\n\
             step 2\n\
             \n=== DONE ===\n"
        );
        assert_eq!(run.state, RunState::Completed);
    }

    #[test]
    fn opened_moves_idle_to_running() {
        let run = run_with(vec![RunEvent::Opened]);
        assert_eq!(run.state, RunState::Running);
        assert!(run.is_active());
    }

    #[test]
    fn error_event_does_not_end_the_run() {
        let run = run_with(vec![RunEvent::Opened, RunEvent::Error("boom".into())]);
        assert_eq!(run.state, RunState::Running);
        assert_eq!(run.log, vec![LogBlock::Error("boom".into())]);
    }

    #[test]
    fn done_completes_and_appends_marker() {
        let run = run_with(vec![RunEvent::Opened, RunEvent::Done]);
        assert_eq!(run.state, RunState::Completed);
        assert_eq!(run.log.last(), Some(&LogBlock::Done));
    }

    #[test]
    fn terminal_transport_failure_fails_without_log_entry() {
        let run = run_with(vec![
            RunEvent::Opened,
            RunEvent::Line("step 1".into()),
            RunEvent::Closed("stream ended".into()),
        ]);
        assert_eq!(run.state, RunState::Failed);
        assert_eq!(run.log.len(), 1);
    }

    #[test]
    fn retrying_changes_nothing() {
        let mut run = run_with(vec![RunEvent::Opened, RunEvent::Line("a".into())]);
        let before = run.clone();
        run.apply(RunEvent::Retrying);
        assert_eq!(run.state, before.state);
        assert_eq!(run.log, before.log);
    }

    #[test]
    fn block_renders_concatenate_to_the_log_rendering() {
        let blocks = vec![
            LogBlock::Line("a".into()),
            LogBlock::Result("r".into()),
            LogBlock::Error("e".into()),
            LogBlock::Done,
        ];
        let mut run = TaskRun::new("t");
        run.log = blocks.clone();

        let concatenated: String = blocks.iter().map(|block| block.render()).collect();
        assert_eq!(concatenated, run.render());
    }

    #[test]
    fn empty_run_renders_empty() {
        let run = TaskRun::new("anything");
        assert_eq!(run.render(), "");
        assert_eq!(run.state, RunState::Idle);
    }
}
