use std::future::Future;

use reqwest::multipart::Form;

use crate::schemas::{
    BatchCreated, BatchGradingResponse, BatchMembership, BatchStatus, StudentFileIds, UploadFile,
};
use crate::services::errors::ClientError;
use crate::services::files::file_part;
use crate::services::http::ApiClient;
use crate::services::validation::{require_text, validate_payload};
use crate::tasks::batch_poller::BatchResultsSource;

pub(crate) const NO_STUDENTS_SELECTED: &str = "Please select at least one student file";

#[derive(Debug, Clone)]
pub struct BatchGradingService {
    api: ApiClient,
}

impl BatchGradingService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Opens a batch for `assignment_id` around the teacher's answer key.
    pub async fn create_batch(
        &self,
        teacher_file: &UploadFile,
        assignment_id: &str,
    ) -> Result<BatchCreated, ClientError> {
        if teacher_file.is_empty() {
            return Err(ClientError::MissingInput("Please select the teacher's answer key"));
        }
        require_text(assignment_id, "Please choose an assignment")?;

        if !teacher_file.is_pdf() {
            tracing::warn!(
                file_name = %teacher_file.file_name,
                mime_type = %teacher_file.mime_type,
                "Teacher reference file is not a PDF; the grader may reject it"
            );
        }

        let form = Form::new()
            .part("teacher_file", file_part(teacher_file)?)
            .text("assignment_id", assignment_id.to_string());

        let request = self.api.post(&["batch-grading"])?.multipart(form);
        let created: BatchCreated = self
            .api
            .send_json(request, "batch_grading.create", "Failed to create batch grading")
            .await?;

        tracing::info!(batch_id = %created.batch_id, assignment_id, "Batch grading created");
        Ok(created)
    }

    /// Registers previously uploaded student files against `batch_id`.
    pub async fn add_students(
        &self,
        batch_id: &str,
        student_file_ids: &[String],
    ) -> Result<BatchMembership, ClientError> {
        require_text(batch_id, "Batch id is required")?;
        if student_file_ids.is_empty() {
            return Err(ClientError::MissingInput(NO_STUDENTS_SELECTED));
        }
        let payload = StudentFileIds { student_file_ids: student_file_ids.to_vec() };
        validate_payload(&payload)?;

        let request = self.api.post(&["batch-grading", batch_id, "students"])?.json(&payload);
        let mut membership: BatchMembership = self
            .api
            .send_json(request, "batch_grading.add_students", "Failed to add students to batch")
            .await?;

        if membership.batch_id.is_empty() {
            membership.batch_id = batch_id.to_string();
        }

        tracing::info!(batch_id, students = student_file_ids.len(), "Students added to batch");
        Ok(membership)
    }

    pub async fn get_results(&self, batch_id: &str) -> Result<BatchGradingResponse, ClientError> {
        require_text(batch_id, "Batch id is required")?;

        let request = self.api.get(&["batch-grading", batch_id, "results"])?;
        let mut response: BatchGradingResponse = self
            .api
            .send_json(request, "batch_grading.results", "Failed to get batch results")
            .await?;

        if response.batch_id.is_empty() {
            response.batch_id = batch_id.to_string();
        }
        Ok(response)
    }

    /// Progress counters only, without the per-student results.
    pub async fn get_status(&self, batch_id: &str) -> Result<BatchStatus, ClientError> {
        require_text(batch_id, "Batch id is required")?;

        let request = self.api.get(&["batch-grading", batch_id, "status"])?;
        let mut status: BatchStatus = self
            .api
            .send_json(request, "batch_grading.status", "Failed to get batch status")
            .await?;

        if status.batch_id.is_empty() {
            status.batch_id = batch_id.to_string();
        }
        Ok(status)
    }
}

impl BatchResultsSource for BatchGradingService {
    fn fetch_results(
        &self,
        batch_id: &str,
    ) -> impl Future<Output = Result<BatchGradingResponse, ClientError>> + Send {
        self.get_results(batch_id)
    }
}
