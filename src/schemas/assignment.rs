use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::null_to_default;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub course_code: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub semester: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub academic_year: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub max_score: f64,
    #[serde(default)]
    pub rubric: Option<BTreeMap<String, String>>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub teacher_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub created_at: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub updated_at: String,
}

/// Payload for `POST /assignments`: an assignment without id or timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAssignment {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "course_code must not be empty"))]
    pub course_code: String,
    pub semester: String,
    pub academic_year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[validate(range(min = 0.0, message = "max_score must be non-negative"))]
    pub max_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<BTreeMap<String, String>>,
    pub teacher_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_assignment() -> NewAssignment {
        NewAssignment {
            title: "Essay 1".to_string(),
            description: None,
            course_code: "ENG101".to_string(),
            semester: "1".to_string(),
            academic_year: "2025".to_string(),
            due_date: None,
            max_score: 100.0,
            rubric: None,
            teacher_id: "t1".to_string(),
        }
    }

    #[test]
    fn new_assignment_validates_title_and_score() {
        assert!(new_assignment().validate().is_ok());

        let mut blank = new_assignment();
        blank.title.clear();
        assert!(blank.validate().is_err());

        let mut negative = new_assignment();
        negative.max_score = -1.0;
        assert!(negative.validate().is_err());
    }

    #[test]
    fn new_assignment_omits_empty_optionals() {
        let value = serde_json::to_value(new_assignment()).expect("json");
        assert!(value.get("description").is_none());
        assert!(value.get("rubric").is_none());
        assert_eq!(value["max_score"], 100.0);
    }
}
