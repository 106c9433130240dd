use pricedesk_core::config::{AppConfig, LoadOptions};
use pricedesk_core::Workspace;
use serde::Serialize;

const AGREEMENT_TEMPLATE: &str = "agreement.html.tera";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> (u8, String) {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return (exit_code, output);
    }

    (exit_code, render_human(&report))
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_demo_data());
            checks.push(check_agreement_template(&config));
            checks.push(check_pdf_converter());
            checks.push(check_llm_provider(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["demo_data", "agreement_template", "pdf_converter", "llm_provider"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks
        .iter()
        .any(|check| matches!(check.status, CheckStatus::Fail | CheckStatus::Skipped));
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_demo_data() -> DoctorCheck {
    match Workspace::demo() {
        Ok(workspace) => DoctorCheck {
            name: "demo_data",
            status: CheckStatus::Pass,
            details: format!(
                "{} demo requests across {} actors",
                workspace.store().len(),
                workspace.directory().len()
            ),
        },
        Err(error) => DoctorCheck {
            name: "demo_data",
            status: CheckStatus::Fail,
            details: format!("demo dataset is inconsistent: {error}"),
        },
    }
}

fn check_agreement_template(config: &AppConfig) -> DoctorCheck {
    let Some(dir) = &config.agreements.template_dir else {
        return DoctorCheck {
            name: "agreement_template",
            status: CheckStatus::Pass,
            details: "using the embedded agreement template".to_string(),
        };
    };

    let path = dir.join(AGREEMENT_TEMPLATE);
    if path.is_file() {
        DoctorCheck {
            name: "agreement_template",
            status: CheckStatus::Pass,
            details: format!("found `{}`", path.display()),
        }
    } else {
        DoctorCheck {
            name: "agreement_template",
            status: CheckStatus::Fail,
            details: format!("`{}` does not exist", path.display()),
        }
    }
}

fn check_pdf_converter() -> DoctorCheck {
    match which::which("wkhtmltopdf") {
        Ok(path) => DoctorCheck {
            name: "pdf_converter",
            status: CheckStatus::Pass,
            details: format!("wkhtmltopdf at `{}`", path.display()),
        },
        Err(_) => DoctorCheck {
            name: "pdf_converter",
            status: CheckStatus::Warn,
            details: "wkhtmltopdf not found; agreements will be exported as HTML".to_string(),
        },
    }
}

fn check_llm_provider(config: &AppConfig) -> DoctorCheck {
    DoctorCheck {
        name: "llm_provider",
        status: CheckStatus::Pass,
        details: format!(
            "{} model `{}` at {} (endpoint not probed)",
            config.llm.provider.as_str(),
            config.llm.model,
            config.llm.effective_base_url()
        ),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
