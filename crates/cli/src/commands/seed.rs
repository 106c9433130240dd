use pricedesk_core::agreement::format_currency;
use pricedesk_core::config::{AppConfig, LoadOptions};
use pricedesk_core::{fixtures, RequestStore, WorkflowEngine, Workspace};
use serde_json::json;

use crate::commands::CommandResult;

/// Loads the demo dataset into a fresh workspace and reports what it holds.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let store = match RequestStore::seeded(fixtures::demo_requests()) {
        Ok(store) => store,
        Err(error) => return CommandResult::failure("seed", "seed_execution", error.to_string(), 5),
    };
    let engine = WorkflowEngine::default()
        .with_id_prefix(config.workflow.id_prefix.clone())
        .with_id_year(config.workflow.id_year);
    let workspace = Workspace::new(fixtures::demo_directory(), store, engine)
        .with_agreement_defaults(config.agreements.defaults());

    let request_lines: Vec<String> = workspace
        .store()
        .iter()
        .map(|request| {
            format!(
                "  - {}: {} ({}, {}, owner {})",
                request.id,
                request.customer_name,
                request.status,
                format_currency(request.value),
                request.sales_rep_id
            )
        })
        .collect();

    let summary = workspace.dashboard();
    let message = format!(
        "demo dataset loaded: {} requests, {} actors\n{}",
        workspace.store().len(),
        workspace.directory().len(),
        request_lines.join("\n")
    );
    let data = json!({
        "actors": workspace.directory().len(),
        "dashboard": summary,
    });

    CommandResult::success_with_data("seed", message, Some(data))
}
