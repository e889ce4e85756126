use serde::{Deserialize, Serialize};
use validator::Validate;

use super::null_to_default;

/// A classroom row from the BaaS `classes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub grade: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub academic_year: String,
    #[serde(default)]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub assignment_count: Option<u64>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub created_at: String,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewClass {
    #[validate(length(min = 1, message = "Class name must not be empty"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Insert row for a new class: the caller's fields plus server-side defaults.
#[derive(Debug, Serialize)]
pub(crate) struct ClassInsert<'a> {
    #[serde(flatten)]
    pub(crate) class: &'a NewClass,
    pub(crate) created_at: String,
    pub(crate) assignment_count: u64,
}
