use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use pricedesk_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::CommandResult;

struct Entry {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::text(2, format!("config validation failed: {error}")),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    for entry in entries(&config) {
        let source = field_source(
            entry.key,
            entry.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(entry.key, &entry.value, source));
    }

    CommandResult::text(0, lines.join("\n"))
}

fn entries(config: &AppConfig) -> Vec<Entry> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    let base_url = match &config.llm.base_url {
        Some(url) => url.clone(),
        None => format!("{} (provider default)", config.llm.effective_base_url()),
    };

    vec![
        Entry {
            key: "llm.provider",
            value: config.llm.provider.as_str().to_string(),
            env_keys: &["PRICEDESK_LLM_PROVIDER"],
        },
        Entry {
            key: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["PRICEDESK_LLM_MODEL"],
        },
        Entry { key: "llm.base_url", value: base_url, env_keys: &["PRICEDESK_LLM_BASE_URL"] },
        Entry { key: "llm.api_key", value: api_key, env_keys: &["PRICEDESK_LLM_API_KEY"] },
        Entry {
            key: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["PRICEDESK_LLM_TIMEOUT_SECS"],
        },
        Entry {
            key: "llm.max_retries",
            value: config.llm.max_retries.to_string(),
            env_keys: &["PRICEDESK_LLM_MAX_RETRIES"],
        },
        Entry {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["PRICEDESK_SERVER_BIND_ADDRESS"],
        },
        Entry {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["PRICEDESK_SERVER_PORT"],
        },
        Entry {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["PRICEDESK_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Entry {
            key: "workflow.id_prefix",
            value: config.workflow.id_prefix.clone(),
            env_keys: &["PRICEDESK_WORKFLOW_ID_PREFIX"],
        },
        Entry {
            key: "workflow.id_year",
            value: config
                .workflow
                .id_year
                .map(|year| year.to_string())
                .unwrap_or_else(|| "<current year>".to_string()),
            env_keys: &["PRICEDESK_WORKFLOW_ID_YEAR"],
        },
        Entry {
            key: "workflow.seed_demo_data",
            value: config.workflow.seed_demo_data.to_string(),
            env_keys: &["PRICEDESK_WORKFLOW_SEED_DEMO_DATA"],
        },
        Entry {
            key: "agreements.template_dir",
            value: config
                .agreements
                .template_dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "<embedded>".to_string()),
            env_keys: &["PRICEDESK_AGREEMENTS_TEMPLATE_DIR"],
        },
        Entry {
            key: "agreements.company_name",
            value: config.agreements.company_name.clone(),
            env_keys: &["PRICEDESK_AGREEMENTS_COMPANY_NAME"],
        },
        Entry {
            key: "agreements.placeholder_expiration",
            value: config.agreements.placeholder_expiration.to_string(),
            env_keys: &["PRICEDESK_AGREEMENTS_PLACEHOLDER_EXPIRATION"],
        },
        Entry {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["PRICEDESK_LOGGING_LEVEL", "PRICEDESK_LOG_LEVEL"],
        },
        Entry {
            key: "logging.format",
            value: config.logging.format.as_str().to_string(),
            env_keys: &["PRICEDESK_LOGGING_FORMAT", "PRICEDESK_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn tokens_keep_only_their_prefix() {
        assert_eq!(redact_token("sk-live-abc123"), "sk-***");
        assert_eq!(redact_token("plainsecret"), "<redacted>");
        assert_eq!(redact_token("  "), "<empty>");
    }

    #[test]
    fn nested_keys_are_found_in_toml_documents() {
        let doc: toml::Value = "[server]\nport = 9090\n".parse().expect("toml");
        assert!(contains_path(&doc, "server.port"));
        assert!(!contains_path(&doc, "server.bind_address"));
        assert!(!contains_path(&doc, "llm.model"));
    }
}
