use crate::schemas::{FileRecord, FileType, UploadFile};
use crate::services::errors::ClientError;
use crate::services::FilesService;

/// State of the upload form before submission.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub file: Option<UploadFile>,
    pub file_type: FileType,
    pub assignment_id: String,
}

impl UploadForm {
    pub fn new(file_type: FileType, assignment_id: impl Into<String>) -> Self {
        Self { file: None, file_type, assignment_id: assignment_id.into() }
    }

    pub fn with_file(mut self, file: UploadFile) -> Self {
        self.file = Some(file);
        self
    }

    /// Sends the chosen file. Nothing goes over the wire without one.
    pub async fn submit(&self, files: &FilesService) -> Result<FileRecord, ClientError> {
        let file = self
            .file
            .as_ref()
            .ok_or(ClientError::MissingInput("Please select a file to upload"))?;
        files.upload_file(file, self.file_type, &self.assignment_id).await
    }
}
