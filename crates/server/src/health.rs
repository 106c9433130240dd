use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::api::ApiState;

const WORKSPACE_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub workspace: HealthCheck,
    pub documents: HealthCheck,
    pub llm: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let workspace = workspace_check(&state).await;
    let ready = workspace.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "pricedesk-server runtime initialized".to_string(),
        },
        workspace,
        documents: documents_check(&state),
        llm: llm_check(&state),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn workspace_check(state: &ApiState) -> HealthCheck {
    match tokio::time::timeout(WORKSPACE_PROBE_TIMEOUT, state.workspace.lock()).await {
        Ok(workspace) => HealthCheck {
            status: "ready",
            detail: format!(
                "{} requests, {} actors",
                workspace.store().len(),
                workspace.directory().len()
            ),
        },
        Err(_) => HealthCheck {
            status: "degraded",
            detail: format!(
                "workspace lock not acquired within {}ms",
                WORKSPACE_PROBE_TIMEOUT.as_millis()
            ),
        },
    }
}

// Missing wkhtmltopdf only downgrades exports to HTML, so it never fails readiness.
fn documents_check(state: &ApiState) -> HealthCheck {
    if state.renderer.converter_available() {
        HealthCheck { status: "ready", detail: "agreements exported as PDF".to_string() }
    } else {
        HealthCheck {
            status: "fallback",
            detail: "wkhtmltopdf not found; agreements exported as HTML".to_string(),
        }
    }
}

fn llm_check(state: &ApiState) -> HealthCheck {
    match state.llm_provider {
        Some(provider) => HealthCheck {
            status: "configured",
            detail: format!("provider {} (not probed)", provider.as_str()),
        },
        None => HealthCheck { status: "unconfigured", detail: "no provider recorded".to_string() },
    }
}

#[cfg(test)]
mod tests {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, Json};
    use pricedesk_agent::LlmClient;
    use pricedesk_core::config::LlmProvider;
    use pricedesk_core::Workspace;

    use crate::api::ApiState;
    use crate::document::AgreementRenderer;
    use crate::health::health;

    struct OfflineClient;

    #[async_trait]
    impl LlmClient for OfflineClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("offline"))
        }
    }

    fn state() -> ApiState {
        let renderer =
            AgreementRenderer::with_embedded_template().expect("template").without_converter();
        ApiState::new(Workspace::demo().expect("demo"), renderer, Box::new(OfflineClient))
            .with_llm_provider(LlmProvider::Ollama)
    }

    #[tokio::test]
    async fn health_returns_ready_when_workspace_is_reachable() {
        let (status, Json(payload)) = health(State(state())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.workspace.detail, "5 requests, 10 actors");
        assert_eq!(payload.documents.status, "fallback");
        assert_eq!(payload.llm.detail, "provider ollama (not probed)");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_while_workspace_is_held() {
        let state = state();
        let workspace = state.workspace();
        let _guard = workspace.lock().await;

        let (status, Json(payload)) = health(State(state.clone())).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.workspace.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
