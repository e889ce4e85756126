use crate::schemas::{
    GradingRequest, GradingResponse, RubricGradingRequest, RubricGradingResponse,
};
use crate::services::errors::ClientError;
use crate::services::http::ApiClient;
use crate::services::validation::{require_text, validate_payload};

/// Grades a single student's submission synchronously.
#[derive(Debug, Clone)]
pub struct GradingService {
    api: ApiClient,
}

impl GradingService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn grade_submission(
        &self,
        assignment_id: &str,
        request: &GradingRequest,
    ) -> Result<GradingResponse, ClientError> {
        require_text(assignment_id, "Please choose an assignment")?;
        validate_payload(request)?;

        tracing::info!(assignment_id, student_id = %request.student_id, "Requesting grading");
        let builder = self.api.post(&["grading", assignment_id])?.json(request);
        self.api.send_json(builder, "grading.grade", "Failed to grade submission").await
    }

    /// Grades a free-form answer against a reference answer and rubric,
    /// without any stored assignment.
    pub async fn grade_answer(
        &self,
        request: &RubricGradingRequest,
    ) -> Result<RubricGradingResponse, ClientError> {
        validate_payload(request)?;

        tracing::info!(
            answer_chars = request.student_answer.chars().count(),
            "Requesting rubric grading"
        );
        let builder = self.api.post(&["grading", "grade", ""])?.json(request);
        self.api.send_json(builder, "grading.grade_answer", "Failed to grade assignment").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{api_client, FakeBackend};
    use serde_json::json;

    #[tokio::test]
    async fn grade_submission_posts_student_id() {
        let backend = FakeBackend::start().await;
        backend.respond(
            "POST /grading/a1",
            200,
            json!({
                "assignment_id": "a1",
                "student_id": "s1",
                "score": 85,
                "feedback": "Solid answer",
                "strengths": ["structure"],
                "areas_for_improvement": ["citations"],
                "missed_concepts": []
            }),
        );
        let service = GradingService::new(api_client(&backend));

        let response = service
            .grade_submission("a1", &GradingRequest { student_id: "s1".to_string() })
            .await
            .expect("grade");

        assert_eq!(response.score, 85.0);
        assert_eq!(response.areas_for_improvement, vec!["citations".to_string()]);
        assert_eq!(backend.requests()[0].json, Some(json!({"student_id": "s1"})));
    }

    fn rubric_request() -> RubricGradingRequest {
        RubricGradingRequest {
            student_answer: "Water boils at 100 C at sea level".to_string(),
            reference_answer: "At 1 atm water boils at 100 degrees Celsius".to_string(),
            rubric: json!({"accuracy": {"weight": 70}, "clarity": {"weight": 30}}),
        }
    }

    #[tokio::test]
    async fn grade_answer_posts_rubric_payload() {
        let backend = FakeBackend::start().await;
        backend.respond(
            "POST /grading/grade/",
            200,
            json!({"success": true, "grading_result": {"score": 88, "feedback": "Accurate"}}),
        );
        let service = GradingService::new(api_client(&backend));

        let response = service.grade_answer(&rubric_request()).await.expect("grade answer");

        assert!(response.success);
        assert_eq!(response.grading_result["score"], 88);
        let body = backend.requests()[0].json.clone().expect("json body");
        assert_eq!(body["reference_answer"], "At 1 atm water boils at 100 degrees Celsius");
        assert_eq!(body["rubric"]["accuracy"]["weight"], 70);
    }

    #[tokio::test]
    async fn grade_answer_rejects_non_object_rubric_locally() {
        let backend = FakeBackend::start().await;
        let service = GradingService::new(api_client(&backend));
        let request = RubricGradingRequest { rubric: json!("accuracy"), ..rubric_request() };

        let err = service.grade_answer(&request).await.unwrap_err();

        assert_eq!(err.to_string(), "rubric must be a JSON object");
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn grade_answer_server_error_uses_detail() {
        let backend = FakeBackend::start().await;
        backend.respond(
            "POST /grading/grade/",
            500,
            json!({"detail": "Error grading assignment: model unavailable"}),
        );
        let service = GradingService::new(api_client(&backend));

        let err = service.grade_answer(&rubric_request()).await.unwrap_err();

        assert_eq!(err.to_string(), "Error grading assignment: model unavailable");
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn grade_submission_reports_validation_detail_list() {
        let backend = FakeBackend::start().await;
        backend.respond(
            "POST /grading/a1",
            422,
            json!({"detail": [{"loc": ["body", "student_id"], "msg": "field required"}]}),
        );
        let service = GradingService::new(api_client(&backend));

        let err = service
            .grade_submission("a1", &GradingRequest { student_id: "s1".to_string() })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "field required");
    }
}
