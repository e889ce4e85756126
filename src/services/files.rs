use reqwest::multipart::{Form, Part};

use crate::schemas::{FileRecord, FileType, UploadFile};
use crate::services::errors::ClientError;
use crate::services::http::ApiClient;
use crate::services::validation::require_text;

#[derive(Debug, Clone)]
pub struct FilesService {
    api: ApiClient,
}

impl FilesService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `POST /files` as multipart `file`, `file_type`, `assignment_id`.
    pub async fn upload_file(
        &self,
        file: &UploadFile,
        file_type: FileType,
        assignment_id: &str,
    ) -> Result<FileRecord, ClientError> {
        if file.is_empty() {
            return Err(ClientError::MissingInput("Please select a file to upload"));
        }
        require_text(assignment_id, "Please choose an assignment")?;

        let form = Form::new()
            .part("file", file_part(file)?)
            .text("file_type", file_type.as_str())
            .text("assignment_id", assignment_id.to_string());

        tracing::info!(
            file_name = %file.file_name,
            file_type = %file_type,
            assignment_id,
            size = file.bytes.len(),
            "Uploading file"
        );

        let request = self.api.post(&["files"])?.multipart(form);
        let record: FileRecord =
            self.api.send_json(request, "files.upload", "Failed to upload file").await?;

        tracing::info!(file_id = %record.id, "File uploaded");
        Ok(record)
    }
}

pub(crate) fn file_part(file: &UploadFile) -> Result<Part, ClientError> {
    Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.mime_type)
        .map_err(|_| ClientError::InvalidInput(format!("Unsupported MIME type '{}'", file.mime_type)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{api_client, FakeBackend};
    use serde_json::json;

    #[tokio::test]
    async fn upload_sends_multipart_fields() {
        let backend = FakeBackend::start().await;
        backend.respond(
            "POST /files",
            200,
            json!({
                "id": "f1",
                "file_name": "s1.pdf",
                "file_path": "uploads/s1.pdf",
                "file_type": "student",
                "file_size": 3,
                "mime_type": "application/pdf",
                "assignment_id": "a1",
                "text_content": "answer",
                "created_at": "2025-03-01T09:15:00Z"
            }),
        );

        let service = FilesService::new(api_client(&backend));
        let file = UploadFile::new("s1.pdf", b"pdf".to_vec());
        let record = service.upload_file(&file, FileType::Student, "a1").await.expect("upload");

        assert_eq!(record.id, "f1");
        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].fields.get("file_type").map(String::as_str), Some("student"));
        assert_eq!(requests[0].fields.get("assignment_id").map(String::as_str), Some("a1"));
        assert_eq!(requests[0].files.get("file").map(|(name, size)| (name.as_str(), *size)), Some(("s1.pdf", 3)));
    }

    #[tokio::test]
    async fn empty_file_is_rejected_without_network_call() {
        let backend = FakeBackend::start().await;
        let service = FilesService::new(api_client(&backend));

        let err = service
            .upload_file(&UploadFile::new("s1.pdf", Vec::new()), FileType::Student, "a1")
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::MissingInput(_)));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn upload_error_uses_detail_or_fallback() {
        let backend = FakeBackend::start().await;
        backend.respond("POST /files", 400, json!({"detail": "Invalid file type. Must be 'teacher' or 'student'"}));
        let service = FilesService::new(api_client(&backend));
        let file = UploadFile::new("s1.pdf", b"pdf".to_vec());

        let err = service.upload_file(&file, FileType::Teacher, "a1").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid file type. Must be 'teacher' or 'student'");

        backend.respond_empty("POST /files", 500);
        let err = service.upload_file(&file, FileType::Teacher, "a1").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to upload file");
        assert_eq!(err.status(), Some(500));
    }
}
