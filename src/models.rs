use std::io::Write;
use std::time::Duration;

use crate::sink::LineSink;

pub type SendableError = Box<dyn std::error::Error + Send + Sync>;

/// Opaque position in a log stream, as handed out by the source.
pub type PageToken = String;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub timestamp: i64,
    pub message: String,
}

impl LogEvent {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }
}

/// Where the next page should start: a held token, or the session's start time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPosition {
    StartTime(i64),
    Token(PageToken),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub log_group: String,
    pub log_stream: String,
    pub position: FetchPosition,
}

/// One bounded batch from the source. `next_token` is `None` only when the
/// source broke its contract.
#[derive(Debug, Clone, Default)]
pub struct LogPage {
    pub events: Vec<LogEvent>,
    pub next_token: Option<PageToken>,
}

pub struct TailSession<W: Write> {
    pub log_group: String,
    pub log_stream: String,
    /// Inclusive lower bound, epoch milliseconds.
    pub start_time: i64,
    pub poll_interval: Duration,
    pub sink: LineSink<W>,
}

impl<W: Write> TailSession<W> {
    pub fn new(
        log_group: impl Into<String>,
        log_stream: impl Into<String>,
        start_time: i64,
        sink: LineSink<W>,
    ) -> Self {
        Self {
            log_group: log_group.into(),
            log_stream: log_stream.into(),
            start_time,
            poll_interval: DEFAULT_POLL_INTERVAL,
            sink,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub(crate) fn request(&self, current_token: Option<&PageToken>) -> FetchRequest {
        let position = match current_token {
            Some(token) => FetchPosition::Token(token.clone()),
            None => FetchPosition::StartTime(self.start_time),
        };
        FetchRequest {
            log_group: self.log_group.clone(),
            log_stream: self.log_stream.clone(),
            position,
        }
    }
}

pub struct StreamSummary {
    pub log_stream_name: String,
    pub last_event_timestamp: Option<i64>,
}
