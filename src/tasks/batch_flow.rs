use tokio::sync::watch;

use crate::core::config::PollingSettings;
use crate::schemas::{BatchGradingResponse, UploadFile};
use crate::services::batch_grading::NO_STUDENTS_SELECTED;
use crate::services::errors::ClientError;
use crate::services::validation::require_text;
use crate::services::BatchGradingService;
use crate::tasks::batch_poller::{BatchPoller, PollOutcome};
use crate::views::{FileSelection, ResultsView};

/// A batch as tracked by the client once it exists on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHandle {
    pub batch_id: String,
    pub assignment_id: String,
    pub student_file_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BatchFlowReport {
    pub batch: BatchHandle,
    pub outcome: PollOutcome,
}

impl BatchFlowReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, PollOutcome::Completed(_))
    }

    /// Results table for a completed batch, or the partial view when the run
    /// was cancelled after at least one response.
    pub fn results_view(&self) -> Option<ResultsView> {
        self.outcome.response().map(ResultsView::from_response)
    }
}

/// Create → add students → poll, with any error aborting the run.
pub struct BatchFlow {
    batches: BatchGradingService,
    polling: PollingSettings,
    shutdown: Option<watch::Receiver<bool>>,
}

impl BatchFlow {
    pub fn new(batches: BatchGradingService, polling: PollingSettings) -> Self {
        Self { batches, polling, shutdown: None }
    }

    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub async fn run(
        &self,
        teacher_file: Option<&UploadFile>,
        assignment_id: &str,
        selection: &FileSelection,
    ) -> Result<BatchFlowReport, ClientError> {
        let student_file_ids = selection.ensure_non_empty()?;
        self.run_with_ids(teacher_file, assignment_id, student_file_ids).await
    }

    pub async fn run_with_ids(
        &self,
        teacher_file: Option<&UploadFile>,
        assignment_id: &str,
        student_file_ids: Vec<String>,
    ) -> Result<BatchFlowReport, ClientError> {
        let teacher_file = teacher_file
            .filter(|file| !file.is_empty())
            .ok_or(ClientError::MissingInput("Please select the teacher's answer key"))?;
        require_text(assignment_id, "Please choose an assignment")?;
        if student_file_ids.is_empty() {
            return Err(ClientError::MissingInput(NO_STUDENTS_SELECTED));
        }

        let created = self.batches.create_batch(teacher_file, assignment_id).await?;
        let batch = BatchHandle {
            batch_id: created.batch_id,
            assignment_id: assignment_id.to_string(),
            student_file_ids,
        };

        self.batches.add_students(&batch.batch_id, &batch.student_file_ids).await?;
        let outcome = self.watch(&batch.batch_id).await?;

        Ok(BatchFlowReport { batch, outcome })
    }

    /// Polls an existing batch until it completes or shutdown fires.
    pub async fn watch(&self, batch_id: &str) -> Result<PollOutcome, ClientError> {
        self.watch_with_progress(batch_id, |_| {}).await
    }

    pub async fn watch_with_progress<F>(
        &self,
        batch_id: &str,
        on_update: F,
    ) -> Result<PollOutcome, ClientError>
    where
        F: FnMut(&BatchGradingResponse),
    {
        require_text(batch_id, "Batch id is required")?;
        let mut poller = BatchPoller::from_settings(&self.batches, &self.polling);
        if let Some(shutdown) = &self.shutdown {
            poller = poller.with_shutdown(shutdown.clone());
        }
        poller.poll_with_progress(batch_id, on_update).await
    }
}
