use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use super::null_to_default;

#[derive(Debug, Clone, Serialize, Validate)]
pub struct GradingRequest {
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    pub student_id: String,
}

/// Free-form answer graded against a reference answer and rubric.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RubricGradingRequest {
    #[validate(length(min = 1, message = "student_answer must not be empty"))]
    pub student_answer: String,
    #[validate(length(min = 1, message = "reference_answer must not be empty"))]
    pub reference_answer: String,
    #[validate(custom(function = "rubric_is_object"))]
    pub rubric: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricGradingResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_to_default")]
    pub grading_result: Value,
}

fn rubric_is_object(rubric: &Value) -> Result<(), ValidationError> {
    if rubric.is_object() {
        return Ok(());
    }
    Err(ValidationError::new("rubric").with_message("rubric must be a JSON object".into()))
}

/// Per-student outcome produced by the grading service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradingResponse {
    #[serde(default, deserialize_with = "null_to_default")]
    pub assignment_id: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub student_id: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub score: f64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub feedback: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub areas_for_improvement: Vec<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub missed_concepts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graded_at: Option<String>,
    #[serde(default, deserialize_with = "null_to_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub rubric_scores: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCreated {
    pub batch_id: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_to_default")]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct StudentFileIds {
    #[validate(length(min = 1, message = "Please select at least one student file"))]
    pub student_file_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMembership {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_to_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub batch_id: String,
}

/// Aggregate batch state, polled until it reports completion.
///
/// The grading backend reports progress either with a `completed` flag or
/// with a `status` string (`created`, `processing`, `completed`, `error`),
/// and sends `results` either as a list or as an object keyed by student
/// file id. Both shapes are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchGradingResponse {
    #[serde(default, deserialize_with = "null_to_default")]
    pub batch_id: String,
    #[serde(default, deserialize_with = "deserialize_results")]
    pub results: Vec<GradingResponse>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchGradingResponse {
    pub fn is_completed(&self) -> bool {
        self.completed || self.status_is("completed")
    }

    pub fn is_failed(&self) -> bool {
        self.status_is("error") || self.status_is("failed")
    }

    fn status_is(&self, expected: &str) -> bool {
        self.status.as_deref().is_some_and(|status| status.eq_ignore_ascii_case(expected))
    }
}

/// Progress counters from `GET /batch-grading/{id}/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStatus {
    #[serde(default, deserialize_with = "null_to_default")]
    pub batch_id: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub status: String,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub completed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResultsShape {
    List(Vec<GradingResponse>),
    Keyed(BTreeMap<String, GradingResponse>),
}

fn deserialize_results<'de, D>(deserializer: D) -> Result<Vec<GradingResponse>, D::Error>
where
    D: Deserializer<'de>,
{
    let results = match Option::<ResultsShape>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ResultsShape::List(results)) => results,
        Some(ResultsShape::Keyed(keyed)) => keyed
            .into_iter()
            .map(|(file_id, mut result)| {
                if result.file_id.is_none() {
                    result.file_id = Some(file_id);
                }
                result
            })
            .collect(),
    };
    Ok(results)
}
