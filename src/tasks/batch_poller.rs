use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

use crate::core::config::PollingSettings;
use crate::core::metrics::record_poll;
use crate::schemas::BatchGradingResponse;
use crate::services::errors::ClientError;

/// Anything that can report the current state of a batch.
pub trait BatchResultsSource: Send + Sync {
    fn fetch_results(
        &self,
        batch_id: &str,
    ) -> impl Future<Output = Result<BatchGradingResponse, ClientError>> + Send;
}

impl<T: BatchResultsSource> BatchResultsSource for &T {
    fn fetch_results(
        &self,
        batch_id: &str,
    ) -> impl Future<Output = Result<BatchGradingResponse, ClientError>> + Send {
        (**self).fetch_results(batch_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(BatchGradingResponse),
    /// Shutdown was requested before the batch finished.
    Cancelled { last: Option<BatchGradingResponse> },
}

impl PollOutcome {
    pub fn response(&self) -> Option<&BatchGradingResponse> {
        match self {
            Self::Completed(response) => Some(response),
            Self::Cancelled { last } => last.as_ref(),
        }
    }
}

/// Queries a batch on a fixed interval until it reports completion.
///
/// No retry and no backoff: the first failed query ends the run and the
/// state stays `Polling`.
pub struct BatchPoller<S> {
    source: S,
    interval: Duration,
    shutdown: Option<watch::Receiver<bool>>,
    state: PollState,
}

impl<S: BatchResultsSource> BatchPoller<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self { source, interval, shutdown: None, state: PollState::Polling }
    }

    pub fn from_settings(source: S, settings: &PollingSettings) -> Self {
        Self::new(source, settings.interval())
    }

    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn poll_until_complete(&mut self, batch_id: &str) -> Result<PollOutcome, ClientError> {
        self.poll_with_progress(batch_id, |_| {}).await
    }

    /// Like [`poll_until_complete`](Self::poll_until_complete), calling
    /// `on_update` with every response received.
    pub async fn poll_with_progress<F>(
        &mut self,
        batch_id: &str,
        mut on_update: F,
    ) -> Result<PollOutcome, ClientError>
    where
        F: FnMut(&BatchGradingResponse),
    {
        self.state = PollState::Polling;
        let mut last: Option<BatchGradingResponse> = None;
        let mut attempt: u64 = 0;

        loop {
            if self.shutdown_requested() {
                record_poll("cancelled");
                tracing::info!(batch_id, attempt, "Batch polling cancelled");
                return Ok(PollOutcome::Cancelled { last });
            }

            attempt += 1;
            let response = match self.source.fetch_results(batch_id).await {
                Ok(response) => response,
                Err(err) => {
                    record_poll("error");
                    tracing::error!(batch_id, attempt, error = %err, "Batch status query failed");
                    return Err(err);
                }
            };

            if let Some(previous) = &last {
                if response.results.len() < previous.results.len() {
                    tracing::warn!(
                        batch_id,
                        attempt,
                        previous = previous.results.len(),
                        current = response.results.len(),
                        "Batch result count went backwards"
                    );
                }
            }

            on_update(&response);

            if response.is_failed() {
                record_poll("failed");
                let message =
                    response.error.clone().unwrap_or_else(|| "Batch grading failed".to_string());
                tracing::error!(batch_id, attempt, %message, "Batch grading failed");
                return Err(ClientError::BatchFailed { batch_id: batch_id.to_string(), message });
            }

            if response.is_completed() {
                self.state = PollState::Completed;
                record_poll("completed");
                tracing::info!(
                    batch_id,
                    attempt,
                    results = response.results.len(),
                    "Batch grading completed"
                );
                return Ok(PollOutcome::Completed(response));
            }

            record_poll("pending");
            tracing::debug!(
                batch_id,
                attempt,
                results = response.results.len(),
                status = response.status.as_deref().unwrap_or("unknown"),
                "Batch still grading"
            );
            last = Some(response);

            if !self.wait_next_tick().await {
                record_poll("cancelled");
                tracing::info!(batch_id, attempt, "Batch polling cancelled");
                return Ok(PollOutcome::Cancelled { last });
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Sleeps one full interval. Returns false when shutdown fired meanwhile.
    async fn wait_next_tick(&mut self) -> bool {
        let deadline = Instant::now() + self.interval;
        let Some(rx) = self.shutdown.as_mut() else {
            sleep_until(deadline).await;
            return true;
        };

        loop {
            let changed = tokio::select! {
                result = rx.changed() => result,
                _ = sleep_until(deadline) => return true,
            };
            match changed {
                Ok(()) if *rx.borrow() => return false,
                // Still running; the deadline stands.
                Ok(()) => continue,
                Err(_) => break,
            }
        }

        // Sender gone: nobody can cancel any more.
        self.shutdown = None;
        sleep_until(deadline).await;
        true
    }
}
