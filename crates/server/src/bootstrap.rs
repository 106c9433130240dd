use pricedesk_agent::HttpLlmClient;
use pricedesk_core::config::{AppConfig, ConfigError, LoadOptions};
use pricedesk_core::errors::DomainError;
use pricedesk_core::fixtures;
use pricedesk_core::{RequestStore, WorkflowEngine, Workspace};
use thiserror::Error;
use tracing::info;

use crate::api::ApiState;
use crate::document::{AgreementRenderer, DocumentError};

pub struct Application {
    pub config: AppConfig,
    pub state: ApiState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("demo data could not be loaded: {0}")]
    Seed(#[source] DomainError),
    #[error("agreement template could not be loaded: {0}")]
    Documents(#[source] DocumentError),
    #[error("llm client could not be built: {0}")]
    Llm(String),
}

#[allow(dead_code)]
pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let engine = WorkflowEngine::default()
        .with_id_prefix(config.workflow.id_prefix.clone())
        .with_id_year(config.workflow.id_year);

    let store = if config.workflow.seed_demo_data {
        RequestStore::seeded(fixtures::demo_requests()).map_err(BootstrapError::Seed)?
    } else {
        RequestStore::new()
    };
    let workspace = Workspace::new(fixtures::demo_directory(), store, engine)
        .with_agreement_defaults(config.agreements.defaults());
    info!(
        event_name = "system.bootstrap.workspace_ready",
        correlation_id = "bootstrap",
        requests = workspace.store().len(),
        actors = workspace.directory().len(),
        seeded = config.workflow.seed_demo_data,
        "workspace initialized"
    );

    let renderer = AgreementRenderer::new(config.agreements.template_dir.as_deref())
        .map_err(BootstrapError::Documents)?;

    let llm = HttpLlmClient::from_config(&config.llm)
        .map_err(|error| BootstrapError::Llm(format!("{error:#}")))?;
    info!(
        event_name = "system.bootstrap.llm_configured",
        correlation_id = "bootstrap",
        provider = config.llm.provider.as_str(),
        model = %config.llm.model,
        "llm client configured"
    );

    let state = ApiState::new(workspace, renderer, Box::new(llm))
        .with_llm_provider(config.llm.provider);

    Ok(Application { config, state })
}

#[cfg(test)]
mod tests {
    use pricedesk_core::config::{AppConfig, ConfigOverrides, LoadOptions};

    use crate::bootstrap::{bootstrap, bootstrap_with_config, BootstrapError};

    #[tokio::test]
    async fn bootstrap_seeds_demo_data_by_default() {
        let app = bootstrap_with_config(AppConfig::default()).await.expect("bootstrap");

        let workspace = app.state.workspace();
        let workspace = workspace.lock().await;
        assert_eq!(workspace.store().len(), 5);
        assert_eq!(workspace.directory().len(), 10);
    }

    #[tokio::test]
    async fn bootstrap_can_start_with_an_empty_store() {
        let mut config = AppConfig::default();
        config.workflow.seed_demo_data = false;
        config.workflow.id_prefix = "QR".to_string();
        config.workflow.id_year = Some(2030);

        let app = bootstrap_with_config(config).await.expect("bootstrap");
        let workspace = app.state.workspace();
        let workspace = workspace.lock().await;
        assert!(workspace.store().is_empty());
        assert_eq!(workspace.directory().len(), 10);
        assert_eq!(workspace.store().next_id("QR", 2030).as_str(), "QR-2030-001");
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_llm_config() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_provider: Some(pricedesk_core::config::LlmProvider::OpenAi),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let Err(error) = result else { panic!("openai without an api key must fail") };
        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(error.to_string().contains("llm.api_key"));
    }

    #[tokio::test]
    async fn missing_template_dir_is_a_documents_error() {
        let mut config = AppConfig::default();
        config.agreements.template_dir = Some(std::env::temp_dir().join("pricedesk-no-templates"));

        let Err(error) = bootstrap_with_config(config).await else {
            panic!("missing template must fail")
        };
        assert!(matches!(error, BootstrapError::Documents(_)));
    }
}
