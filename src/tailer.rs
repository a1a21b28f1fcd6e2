use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, trace};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, TailError};
use crate::filter::EventFilter;
use crate::models::{FetchRequest, LogPage, PageToken, TailSession};
use crate::utilities::millis_to_datetime;

/// Granularity at which an idle worker notices cancellation.
pub const IDLE_TICK: Duration = Duration::from_millis(100);

/// A remote, paginated, append-only log store.
///
/// Implementations return at most one bounded page per call together with the
/// token to pass back on the next call. The call may block on I/O and is not
/// interrupted by cancellation.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<LogPage>;
}

enum Progress {
    Advanced,
    CaughtUp,
}

pub struct Tailer<S, W: Write> {
    source: S,
    session: TailSession<W>,
    filter: EventFilter,
    current_token: Option<PageToken>,
    cancel: CancellationToken,
}

impl<S, W> Tailer<S, W>
where
    S: LogSource + 'static,
    W: Write + Send + 'static,
{
    pub fn new(source: S, session: TailSession<W>) -> Self {
        let filter = EventFilter::new(session.start_time);
        Self {
            source,
            session,
            filter,
            current_token: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Moves the session onto its own worker task.
    pub fn spawn(self) -> TailHandle {
        let cancel = self.cancel.clone();
        let worker = tokio::spawn(self.run());
        TailHandle { cancel, worker }
    }

    /// Drives the session until it is cancelled or hits a fatal error.
    /// Returns `Ok(())` only for cancellation.
    pub async fn run(mut self) -> Result<()> {
        info!(
            "Tailing {}/{} from {} (poll interval {:?})",
            self.session.log_group,
            self.session.log_stream,
            millis_to_datetime(self.session.start_time),
            self.session.poll_interval
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            let progress = match self.poll_once().await {
                Ok(progress) => progress,
                Err(err) => {
                    error!(
                        "Tail of {}/{} aborted: {}",
                        self.session.log_group, self.session.log_stream, err
                    );
                    return Err(err);
                }
            };
            if let Progress::CaughtUp = progress {
                if idle(&self.cancel, self.session.poll_interval).await {
                    break;
                }
            }
        }

        info!(
            "Tail of {}/{} cancelled",
            self.session.log_group, self.session.log_stream
        );
        Ok(())
    }

    async fn poll_once(&mut self) -> Result<Progress> {
        let request = self.session.request(self.current_token.as_ref());
        let page = self.source.fetch(&request).await?;

        let next_token = page
            .next_token
            .ok_or_else(|| TailError::ProtocolViolation {
                log_group: self.session.log_group.clone(),
                log_stream: self.session.log_stream.clone(),
            })?;

        let filter = self.filter;
        let mut forwarded = 0usize;
        for event in page.events.iter().filter(|event| filter.keep(event)) {
            self.session.sink.append(&event.message)?;
            forwarded += 1;
        }
        self.session.sink.flush()?;

        debug!(
            "Forwarded {} of {} event(s) from {}/{}",
            forwarded,
            page.events.len(),
            self.session.log_group,
            self.session.log_stream
        );

        if self.current_token.as_ref() == Some(&next_token) {
            Ok(Progress::CaughtUp)
        } else {
            self.current_token = Some(next_token);
            Ok(Progress::Advanced)
        }
    }
}

/// Waits out the poll interval in ticks. Returns `true` if cancelled.
async fn idle(cancel: &CancellationToken, poll_interval: Duration) -> bool {
    trace!("No new events, backing off for {:?}", poll_interval);
    for _ in 0..idle_ticks(poll_interval) {
        if cancel.is_cancelled() {
            return true;
        }
        tokio::time::sleep(IDLE_TICK).await;
    }
    cancel.is_cancelled()
}

fn idle_ticks(poll_interval: Duration) -> u128 {
    let tick = IDLE_TICK.as_millis();
    poll_interval.as_millis().div_ceil(tick).max(1)
}

/// Owned handle to a running session. Call [`TailHandle::cancel`] and then
/// [`TailHandle::join`] (or just [`TailHandle::stop`]) to tear it down.
pub struct TailHandle {
    cancel: CancellationToken,
    worker: JoinHandle<Result<()>>,
}

impl TailHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the worker to stop. Safe to race in `select!`; once it has
    /// returned, don't call it again.
    pub async fn join(&mut self) -> Result<()> {
        match (&mut self.worker).await {
            Ok(result) => result,
            Err(err) => {
                error!("Tail worker failed to complete: {}", err);
                Err(TailError::WorkerPanicked)
            }
        }
    }

    pub async fn stop(mut self) -> Result<()> {
        self.cancel();
        self.join().await
    }
}
