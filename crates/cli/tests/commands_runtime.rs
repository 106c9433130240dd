use std::env;
use std::sync::{Mutex, OnceLock};

use pricedesk_cli::commands::{config, doctor, seed};
use serde_json::Value;

#[test]
fn config_attributes_values_to_env_and_defaults() {
    with_env(&[("PRICEDESK_SERVER_PORT", "9191"), ("PRICEDESK_LOG_LEVEL", "debug")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let output = result.output;
        assert!(output.contains("- server.port = 9191 (source: env (PRICEDESK_SERVER_PORT))"));
        assert!(output.contains("- logging.level = debug (source: env (PRICEDESK_LOG_LEVEL))"));
        assert!(output.contains("- workflow.id_prefix = PR (source: default)"));
        assert!(output.contains("- llm.api_key = <unset> (source: default)"));
    });
}

#[test]
fn config_redacts_api_keys() {
    with_env(
        &[("PRICEDESK_LLM_PROVIDER", "openai"), ("PRICEDESK_LLM_API_KEY", "sk-secret-value")],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);
            assert!(result.output.contains("- llm.api_key = sk-*** "));
            assert!(!result.output.contains("secret-value"));
        },
    );
}

#[test]
fn config_reports_validation_failures() {
    with_env(&[("PRICEDESK_LLM_PROVIDER", "anthropic")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);
        assert!(result.output.starts_with("config validation failed"));
    });
}

#[test]
fn doctor_json_lists_every_check() {
    with_env(&[], || {
        let (exit_code, output) = doctor::run(true);
        assert_eq!(exit_code, 0, "defaults should pass readiness: {output}");

        let payload = parse_payload(&output);
        assert_eq!(payload["overall_status"], "pass");
        let names: Vec<&str> = payload["checks"]
            .as_array()
            .expect("checks")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "config_validation",
                "demo_data",
                "agreement_template",
                "pdf_converter",
                "llm_provider"
            ]
        );
    });
}

#[test]
fn doctor_fails_and_skips_when_config_is_invalid() {
    with_env(&[("PRICEDESK_SERVER_PORT", "not-a-port")], || {
        let (exit_code, output) = doctor::run(false);
        assert_eq!(exit_code, 1);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [fail] config_validation"));
        assert!(output.contains("- [skip] demo_data"));
    });
}

#[test]
fn seed_summarizes_the_demo_dataset() {
    with_env(&[], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["actors"], 10);
        assert_eq!(payload["data"]["dashboard"]["totalRequests"], 5);

        let message = payload["message"].as_str().unwrap_or("");
        assert!(message.starts_with("demo dataset loaded: 5 requests, 10 actors"));
        assert!(message.contains("  - PR-2024-005: Cyberdyne (Published, $2,100,000, owner S1)"));
    });
}

#[test]
fn seed_is_deterministic_across_runs() {
    with_env(&[], || {
        let first = parse_payload(&seed::run().output);
        let second = parse_payload(&seed::run().output);
        assert_eq!(first["message"], second["message"]);
    });
}

#[test]
fn seed_returns_config_failure_for_bad_env() {
    with_env(&[("PRICEDESK_WORKFLOW_SEED_DEMO_DATA", "sometimes")], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PRICEDESK_LLM_PROVIDER",
        "PRICEDESK_LLM_API_KEY",
        "PRICEDESK_LLM_BASE_URL",
        "PRICEDESK_LLM_MODEL",
        "PRICEDESK_LLM_TIMEOUT_SECS",
        "PRICEDESK_LLM_MAX_RETRIES",
        "PRICEDESK_SERVER_BIND_ADDRESS",
        "PRICEDESK_SERVER_PORT",
        "PRICEDESK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "PRICEDESK_WORKFLOW_ID_PREFIX",
        "PRICEDESK_WORKFLOW_ID_YEAR",
        "PRICEDESK_WORKFLOW_SEED_DEMO_DATA",
        "PRICEDESK_AGREEMENTS_TEMPLATE_DIR",
        "PRICEDESK_AGREEMENTS_COMPANY_NAME",
        "PRICEDESK_AGREEMENTS_PLACEHOLDER_EXPIRATION",
        "PRICEDESK_LOGGING_LEVEL",
        "PRICEDESK_LOGGING_FORMAT",
        "PRICEDESK_LOG_LEVEL",
        "PRICEDESK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
