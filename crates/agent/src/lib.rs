//! LLM-backed analysis for the pricing desk.
//!
//! - `llm`: the `LlmClient` seam and an HTTP client for OpenAI, Anthropic and Ollama.
//! - `analysis`: discount sensitivity reports and agreement summaries.
//!
//! The model is advisory only. It never moves a request through the workflow.

pub mod analysis;
pub mod llm;

pub use analysis::{AnalysisError, SensitivityAnalyzer, SUMMARY_UNAVAILABLE};
pub use llm::{HttpLlmClient, LlmClient};
