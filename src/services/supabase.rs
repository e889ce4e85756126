use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::core::config::{ApiSettings, ConfigError, Settings, SupabaseSettings};
use crate::core::time::now_rfc3339;
use crate::schemas::class::ClassInsert;
use crate::schemas::{Assignment, Class, FileRecord, FileType, NewClass};
use crate::services::errors::ClientError;
use crate::services::http::{execute_json, join_segments, parse_base_url};
use crate::services::validation::{require_text, validate_payload};

const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// PostgREST client for the BaaS tables the grading screens read.
///
/// Built explicitly from settings and passed to whatever needs it.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: Client,
    rest_url: Url,
}

impl SupabaseClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        Self::new(settings.supabase(), settings.api())
    }

    pub fn new(supabase: &SupabaseSettings, api: &ApiSettings) -> Result<Self, ClientError> {
        let url = supabase
            .url
            .as_deref()
            .ok_or(ConfigError::MissingSecret("NEXT_PUBLIC_SUPABASE_URL"))?;
        let anon_key = supabase
            .anon_key
            .as_deref()
            .ok_or(ConfigError::MissingSecret("NEXT_PUBLIC_SUPABASE_ANON_KEY"))?;

        let base = parse_base_url("NEXT_PUBLIC_SUPABASE_URL", url)?;
        let rest_url = join_segments(&base, &["rest", "v1"])?;

        let client = Client::builder()
            .default_headers(auth_headers(anon_key)?)
            .connect_timeout(Duration::from_secs(api.connect_timeout_seconds))
            .timeout(Duration::from_secs(api.request_timeout_seconds))
            .build()
            .map_err(|source| ClientError::Transport {
                endpoint: "supabase.client.build".to_string(),
                source,
            })?;

        Ok(Self { client, rest_url })
    }

    pub async fn list_classes(&self) -> Result<Vec<Class>, ClientError> {
        let request = self
            .table_get("classes")?
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        self.send(request, "supabase.classes.list", "Failed to load classes").await
    }

    pub async fn get_class(&self, id: &str) -> Result<Option<Class>, ClientError> {
        require_text(id, "Class id is required")?;
        let filter = format!("eq.{id}");
        let request = self
            .table_get("classes")?
            .query(&[("select", "*"), ("id", filter.as_str()), ("limit", "1")]);
        let rows: Vec<Class> =
            self.send(request, "supabase.classes.get", "Failed to load class").await?;
        Ok(rows.into_iter().next())
    }

    pub async fn list_assignments_for_class(
        &self,
        class_id: &str,
    ) -> Result<Vec<Assignment>, ClientError> {
        require_text(class_id, "Class id is required")?;
        let filter = format!("eq.{class_id}");
        let request = self.table_get("assignments")?.query(&[
            ("select", "*"),
            ("class_id", filter.as_str()),
            ("order", "created_at.desc"),
        ]);
        self.send(request, "supabase.assignments.by_class", "Failed to load assignments").await
    }

    pub async fn create_class(&self, class: &NewClass) -> Result<Class, ClientError> {
        validate_payload(class)?;
        let row = ClassInsert { class, created_at: now_rfc3339(), assignment_count: 0 };
        let request = self
            .client
            .post(join_segments(&self.rest_url, &["classes"])?)
            .header("Prefer", "return=representation")
            .header(ACCEPT, OBJECT_MEDIA_TYPE)
            .json(&row);
        let created: Class =
            self.send(request, "supabase.classes.create", "Failed to create class").await?;
        tracing::info!(class_id = %created.id, name = %created.name, "Class created");
        Ok(created)
    }

    /// Student files uploaded for `assignment_id`, oldest first.
    pub async fn list_student_files(
        &self,
        assignment_id: &str,
    ) -> Result<Vec<FileRecord>, ClientError> {
        require_text(assignment_id, "Please choose an assignment")?;
        let assignment_filter = format!("eq.{assignment_id}");
        let type_filter = format!("eq.{}", FileType::Student);
        let request = self.table_get("files")?.query(&[
            ("select", "*"),
            ("assignment_id", assignment_filter.as_str()),
            ("file_type", type_filter.as_str()),
            ("order", "created_at.asc"),
        ]);
        self.send(request, "supabase.files.students", "Failed to load student files").await
    }

    fn table_get(&self, table: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.client.get(join_segments(&self.rest_url, &[table])?))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &'static str,
        fallback: &'static str,
    ) -> Result<T, ClientError> {
        execute_json(request, endpoint, fallback).await
    }
}

fn auth_headers(anon_key: &str) -> Result<HeaderMap, ClientError> {
    let invalid = || ConfigError::InvalidValue {
        field: "NEXT_PUBLIC_SUPABASE_ANON_KEY",
        value: "<redacted>".to_string(),
    };

    let mut apikey = HeaderValue::from_str(anon_key).map_err(|_| invalid())?;
    apikey.set_sensitive(true);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {anon_key}")).map_err(|_| invalid())?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert("apikey", apikey);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}
