use crate::schemas::{Assignment, NewAssignment};
use crate::services::errors::ClientError;
use crate::services::http::ApiClient;
use crate::services::validation::{require_text, validate_payload};

#[derive(Debug, Clone)]
pub struct AssignmentsService {
    api: ApiClient,
}

impl AssignmentsService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<Assignment>, ClientError> {
        let request = self.api.get(&["assignments"])?;
        self.api.send_json(request, "assignments.list", "Failed to get assignments").await
    }

    pub async fn get(&self, id: &str) -> Result<Assignment, ClientError> {
        require_text(id, "Assignment id is required")?;
        let request = self.api.get(&["assignments", id])?;
        self.api.send_json(request, "assignments.get", "Failed to get assignment").await
    }

    pub async fn create(&self, assignment: &NewAssignment) -> Result<Assignment, ClientError> {
        validate_payload(assignment)?;
        let request = self.api.post(&["assignments"])?.json(assignment);
        let created: Assignment = self
            .api
            .send_json(request, "assignments.create", "Failed to create assignment")
            .await?;
        tracing::info!(assignment_id = %created.id, title = %created.title, "Assignment created");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{api_client, FakeBackend};
    use serde_json::json;

    fn assignment_json(id: &str, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "course_code": "ENG101",
            "semester": "1",
            "academic_year": "2025",
            "max_score": 100,
            "teacher_id": "t1",
            "created_at": "2025-03-01T00:00:00Z",
            "updated_at": "2025-03-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn list_and_get_assignments() {
        let backend = FakeBackend::start().await;
        backend.respond("GET /assignments", 200, json!([assignment_json("a1", "Essay 1"), assignment_json("a2", "Essay 2")]));
        backend.respond("GET /assignments/a2", 200, assignment_json("a2", "Essay 2"));
        let service = AssignmentsService::new(api_client(&backend));

        let all = service.list().await.expect("list");
        assert_eq!(all.len(), 2);

        let one = service.get("a2").await.expect("get");
        assert_eq!(one.title, "Essay 2");
        assert_eq!(one.max_score, 100.0);
    }

    #[tokio::test]
    async fn create_rejects_invalid_payload_locally() {
        let backend = FakeBackend::start().await;
        let service = AssignmentsService::new(api_client(&backend));
        let payload = NewAssignment {
            title: String::new(),
            description: None,
            course_code: "ENG101".to_string(),
            semester: "1".to_string(),
            academic_year: "2025".to_string(),
            due_date: None,
            max_score: 100.0,
            rubric: None,
            teacher_id: "t1".to_string(),
        };

        let err = service.create(&payload).await.unwrap_err();

        assert_eq!(err.to_string(), "title must not be empty");
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn get_missing_assignment_uses_fallback() {
        let backend = FakeBackend::start().await;
        backend.respond_empty("GET /assignments/zz", 404);
        let service = AssignmentsService::new(api_client(&backend));

        let err = service.get("zz").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get assignment");
    }
}
