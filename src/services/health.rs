use crate::schemas::HealthStatus;
use crate::services::errors::ClientError;
use crate::services::http::ApiClient;

#[derive(Debug, Clone)]
pub struct HealthService {
    api: ApiClient,
}

impl HealthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn check(&self) -> Result<HealthStatus, ClientError> {
        let request = self.api.get(&["health"])?;
        self.api.send_json(request, "health", "Health check failed").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{api_client, FakeBackend};
    use serde_json::json;

    #[tokio::test]
    async fn check_reads_status() {
        let backend = FakeBackend::start().await;
        backend.respond("GET /health", 200, json!({"status": "ok", "message": "API is running"}));

        let status = HealthService::new(api_client(&backend)).check().await.expect("health");

        assert_eq!(status.status, "ok");
        assert!(backend.requests()[0].headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let api = crate::services::ApiClient::from_settings(
            &crate::core::config::ApiSettings::with_base_url("http://127.0.0.1:9"),
        )
        .expect("client");

        let err = HealthService::new(api).check().await.unwrap_err();

        assert!(matches!(err, ClientError::Transport { .. }));
        assert_eq!(err.to_string(), "Network error while calling health");
    }
}
