//! Agreement document export.
//!
//! Agreements are rendered from a Tera HTML template and converted with
//! `wkhtmltopdf` when it is on the PATH; otherwise the HTML itself is served
//! for the browser to print.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use pricedesk_core::agreement::AgreementDocument;
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{error, info, warn};

pub const AGREEMENT_TEMPLATE: &str = "agreement.html.tera";

/// `2023-10-20` → `October 20, 2023`. Non-date input passes through.
pub fn register_template_filters(tera: &mut Tera) {
    tera.register_filter("long_date", tera_long_date_filter);
}

fn tera_long_date_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let raw = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("long_date filter expects a string input"))?;

    Ok(tera::Value::String(match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug)]
pub struct AgreementRenderer {
    tera: Tera,
    wkhtmltopdf_path: Option<PathBuf>,
}

impl AgreementRenderer {
    /// Loads `agreement.html.tera` from `template_dir`, or the built-in copy
    /// when no directory is configured.
    pub fn new(template_dir: Option<&Path>) -> Result<Self, DocumentError> {
        let tera = match template_dir {
            Some(dir) => {
                let mut tera = Tera::default();
                register_template_filters(&mut tera);
                tera.add_template_file(dir.join(AGREEMENT_TEMPLATE), Some(AGREEMENT_TEMPLATE))
                    .map_err(|e| DocumentError::Template(e.to_string()))?;
                tera
            }
            None => embedded_tera()?,
        };

        let wkhtmltopdf_path = which::which("wkhtmltopdf").ok();
        match &wkhtmltopdf_path {
            Some(path) => info!(
                event_name = "system.documents.converter_found",
                path = %path.display(),
                "wkhtmltopdf found"
            ),
            None => warn!(
                event_name = "system.documents.converter_missing",
                "wkhtmltopdf not found in PATH - agreements will be served as HTML"
            ),
        }

        Ok(Self { tera, wkhtmltopdf_path })
    }

    pub fn with_embedded_template() -> Result<Self, DocumentError> {
        Self::new(None)
    }

    /// Forces HTML output regardless of what is installed.
    pub fn without_converter(mut self) -> Self {
        self.wkhtmltopdf_path = None;
        self
    }

    pub fn converter_available(&self) -> bool {
        self.wkhtmltopdf_path.is_some()
    }

    pub fn render_html(&self, document: &AgreementDocument) -> Result<String, DocumentError> {
        let mut context = Context::new();
        context.insert("agreement", document);
        self.tera
            .render(AGREEMENT_TEMPLATE, &context)
            .map_err(|e| DocumentError::Template(e.to_string()))
    }

    pub async fn render(&self, document: &AgreementDocument) -> Result<Rendered, DocumentError> {
        let html = self.render_html(document)?;

        let Some(wkhtmltopdf) = &self.wkhtmltopdf_path else {
            return Ok(Rendered::Html(html));
        };

        match convert_html_to_pdf(&html, wkhtmltopdf).await {
            Ok(bytes) => Ok(Rendered::Pdf(bytes)),
            Err(e) => {
                warn!(
                    event_name = "documents.agreement.conversion_failed",
                    request_id = %document.request_id,
                    error = %e,
                    "PDF conversion failed, falling back to HTML"
                );
                Ok(Rendered::Html(html))
            }
        }
    }
}

fn embedded_tera() -> Result<Tera, DocumentError> {
    let mut tera = Tera::default();
    register_template_filters(&mut tera);
    tera.add_raw_template(
        AGREEMENT_TEMPLATE,
        include_str!("../../../templates/agreements/agreement.html.tera"),
    )
    .map_err(|e| DocumentError::Template(e.to_string()))?;
    Ok(tera)
}

async fn convert_html_to_pdf(html: &str, wkhtmltopdf: &Path) -> Result<Vec<u8>, DocumentError> {
    let temp_dir = std::env::temp_dir();
    let stem = uuid::Uuid::new_v4();
    let html_path = temp_dir.join(format!("agreement_{stem}.html"));
    let pdf_path = temp_dir.join(format!("agreement_{stem}.pdf"));

    tokio::fs::write(&html_path, html).await?;

    let output = Command::new(wkhtmltopdf)
        .args(["--page-size", "A4", "--encoding", "utf-8", "--quiet"])
        .args(["--margin-top", "15mm", "--margin-bottom", "15mm"])
        .args(["--margin-left", "15mm", "--margin-right", "15mm"])
        .arg(&html_path)
        .arg(&pdf_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let result: Result<Vec<u8>, DocumentError> = match output {
        Ok(output) if output.status.success() => Ok(tokio::fs::read(&pdf_path).await?),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            error!(stderr = %stderr, "wkhtmltopdf failed");
            Err(DocumentError::Conversion(stderr))
        }
        Err(e) => Err(e.into()),
    };

    let _ = tokio::fs::remove_file(&html_path).await;
    let _ = tokio::fs::remove_file(&pdf_path).await;
    result
}

pub enum Rendered {
    Pdf(Vec<u8>),
    Html(String),
}

impl Rendered {
    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf(_))
    }

    pub fn into_response(self, filename: &str) -> Response {
        match self {
            Self::Pdf(bytes) => (
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
                ],
                bytes,
            )
                .into_response(),
            Self::Html(html) => {
                ([(header::CONTENT_TYPE, "text/html; charset=utf-8".to_string())], html)
                    .into_response()
            }
        }
    }
}

/// Flat text rendition handed to the summarizer.
pub fn plain_text(document: &AgreementDocument) -> String {
    let mut lines = vec![
        document.title.clone(),
        format!("Agreement Reference: {}", document.request_id),
        format!("Customer: {}", document.customer_name),
        format!("Region: {}", document.region),
        format!("Total Contract Value: {}", document.total_contract_value),
        format!("Status: {}", document.status),
    ];
    if let Some(level) = &document.service_level {
        lines.push(format!("Service Level: {level}"));
    }
    lines.push(format!("Effective Date: {}", document.effective_date));
    lines.push(format!("Expiration Date: {}", document.expiration_date));
    lines.push(String::new());
    lines.push(document.terms.clone());
    lines.join("\n")
}
