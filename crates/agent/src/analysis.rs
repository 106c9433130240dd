use pricedesk_core::domain::analysis::{
    AnalysisResult, SensitivityScenario, SENSITIVITY_DISCOUNT_TIERS,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{strip_code_fence, LlmClient};

pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
    #[error("analysis provider failed: {0}")]
    Provider(String),
    #[error("analysis provider returned no data")]
    EmptyResponse,
    #[error("analysis provider returned malformed data: {0}")]
    MalformedResponse(String),
}

/// Asks an LLM for a discount sensitivity report on a pricing scenario.
///
/// The model only produces narrative and illustrative numbers; nothing it
/// returns feeds back into the workflow.
pub struct SensitivityAnalyzer<C> {
    client: C,
}

impl<C> SensitivityAnalyzer<C>
where
    C: LlmClient,
{
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn analyze(
        &self,
        scenario: &SensitivityScenario,
    ) -> Result<AnalysisResult, AnalysisError> {
        validate_scenario(scenario)?;

        let reply = self
            .client
            .complete(&build_prompt(scenario))
            .await
            .map_err(|error| AnalysisError::Provider(format!("{error:#}")))?;

        let result = parse_analysis(&reply)?;
        info!(
            event_name = "analysis.sensitivity.completed",
            customer_segment = %scenario.customer_segment,
            tiers = result.sensitivity_data.len(),
            "sensitivity analysis completed"
        );
        Ok(result)
    }

    /// Executive summary of agreement text. An empty reply yields
    /// [`SUMMARY_UNAVAILABLE`].
    pub async fn summarize_agreement(&self, agreement_text: &str) -> Result<String, AnalysisError> {
        let prompt = format!(
            "Summarize the key commercial terms, discount structures, and validity periods \
             from the following logistics pricing agreement text. Keep it executive level.\n\n\
             {agreement_text}"
        );

        let reply = self
            .client
            .complete(&prompt)
            .await
            .map_err(|error| AnalysisError::Provider(format!("{error:#}")))?;

        let summary = reply.trim();
        if summary.is_empty() {
            warn!(event_name = "analysis.summary.empty", "summary provider returned no text");
            return Ok(SUMMARY_UNAVAILABLE.to_string());
        }
        Ok(summary.to_string())
    }
}

pub fn build_prompt(scenario: &SensitivityScenario) -> String {
    let tiers = SENSITIVITY_DISCOUNT_TIERS
        .iter()
        .map(|tier| format!("{tier}%"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Act as a Senior Pricing Analyst for a parcel carrier.\n\
         Analyze a pricing scenario with the following parameters:\n\
         - Base Shipping Rate: ${base_rate}\n\
         - Current Proposed Discount: {discount}%\n\
         - Average Competitor Rate: ${competitor_rate}\n\
         - Annual Volume: {volume} packages\n\
         - Customer Segment: {segment}\n\n\
         Perform a sensitivity analysis.\n\
         1. Provide a strategic recommendation on whether to approve, reject, or negotiate.\n\
         2. Assess the risk of churn vs. profit erosion.\n\
         3. Estimate the projected margin percentage.\n\
         4. Generate hypothetical sensitivity data for discount tiers ({tiers}) showing impact \
         on Margin, Volume (elasticity assumption), and Total Revenue.\n\n\
         Respond with JSON only, shaped as:\n\
         {{\"recommendation\": string, \"riskAssessment\": string, \"projectedMargin\": string, \
         \"sensitivityData\": [{{\"discount\": number, \"margin\": number, \"volume\": number, \
         \"revenue\": number}}]}}",
        base_rate = scenario.base_rate,
        discount = scenario.discount_percent,
        competitor_rate = scenario.competitor_rate,
        volume = scenario.annual_volume,
        segment = scenario.customer_segment.trim(),
    )
}

pub fn parse_analysis(reply: &str) -> Result<AnalysisResult, AnalysisError> {
    let body = strip_code_fence(reply);
    if body.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }
    serde_json::from_str(body).map_err(|error| AnalysisError::MalformedResponse(error.to_string()))
}

fn validate_scenario(scenario: &SensitivityScenario) -> Result<(), AnalysisError> {
    if scenario.base_rate < Decimal::ZERO || scenario.competitor_rate < Decimal::ZERO {
        return Err(AnalysisError::InvalidScenario("rates must not be negative".to_string()));
    }
    if scenario.discount_percent < Decimal::ZERO || scenario.discount_percent > Decimal::ONE_HUNDRED
    {
        return Err(AnalysisError::InvalidScenario(
            "discountPercent must be within 0..=100".to_string(),
        ));
    }
    if scenario.customer_segment.trim().is_empty() {
        return Err(AnalysisError::InvalidScenario("customerSegment must not be blank".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use pricedesk_core::domain::analysis::SensitivityScenario;
    use rust_decimal::Decimal;

    use super::{build_prompt, AnalysisError, SensitivityAnalyzer, SUMMARY_UNAVAILABLE};
    use crate::llm::LlmClient;

    struct ScriptedClient {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Self {
            Self { reply: Ok(reply.to_string()), prompts: Mutex::new(Vec::new()) }
        }

        fn failing(message: &str) -> Self {
            Self { reply: Err(message.to_string()), prompts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().expect("prompt log").push(prompt.to_string());
            self.reply.clone().map_err(|message| anyhow!(message))
        }
    }

    fn scenario() -> SensitivityScenario {
        SensitivityScenario {
            base_rate: Decimal::new(1550, 2),
            discount_percent: Decimal::new(15, 0),
            competitor_rate: Decimal::new(1420, 2),
            annual_volume: 50_000,
            customer_segment: "E-commerce Retail".to_string(),
        }
    }

    #[test]
    fn prompt_lists_parameters_and_discount_tiers() {
        let prompt = build_prompt(&scenario());
        assert!(prompt.contains("Base Shipping Rate: $15.50"));
        assert!(prompt.contains("Current Proposed Discount: 15%"));
        assert!(prompt.contains("Annual Volume: 50000 packages"));
        assert!(prompt.contains("(0%, 5%, 10%, 15%, 20%)"));
        assert!(prompt.contains("\"sensitivityData\""));
    }

    #[tokio::test]
    async fn fenced_json_reply_is_parsed() {
        let reply = r#"```json
{"recommendation":"Negotiate","riskAssessment":"Moderate churn risk","projectedMargin":"18.5%",
 "sensitivityData":[{"discount":0,"margin":28.0,"volume":45000,"revenue":697500},
                    {"discount":5,"margin":24.5,"volume":47500,"revenue":699437.5}]}
```"#;
        let analyzer = SensitivityAnalyzer::new(ScriptedClient::replying(reply));

        let result = analyzer.analyze(&scenario()).await.expect("analysis");
        assert_eq!(result.recommendation, "Negotiate");
        assert_eq!(result.projected_margin, "18.5%");
        assert_eq!(result.sensitivity_data.len(), 2);
        assert_eq!(result.sensitivity_data[1].discount, 5.0);
    }

    #[tokio::test]
    async fn failures_surface_as_analysis_errors() {
        let empty = SensitivityAnalyzer::new(ScriptedClient::replying("   "));
        assert!(matches!(empty.analyze(&scenario()).await, Err(AnalysisError::EmptyResponse)));

        let garbled = SensitivityAnalyzer::new(ScriptedClient::replying("I think you should"));
        assert!(matches!(
            garbled.analyze(&scenario()).await,
            Err(AnalysisError::MalformedResponse(_))
        ));

        let down = SensitivityAnalyzer::new(ScriptedClient::failing("connection refused"));
        match down.analyze(&scenario()).await {
            Err(AnalysisError::Provider(message)) => assert!(message.contains("connection refused")),
            other => panic!("expected provider failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_scenario_never_reaches_the_provider() {
        let client = ScriptedClient::replying("{}");
        let analyzer = SensitivityAnalyzer::new(client);
        let mut bad = scenario();
        bad.discount_percent = Decimal::new(150, 0);

        assert!(matches!(analyzer.analyze(&bad).await, Err(AnalysisError::InvalidScenario(_))));
        assert!(analyzer.client.prompts.lock().expect("prompt log").is_empty());
    }

    #[tokio::test]
    async fn empty_summary_falls_back() {
        let analyzer = SensitivityAnalyzer::new(ScriptedClient::replying(""));
        let summary = analyzer.summarize_agreement("Agreement text").await.expect("summary");
        assert_eq!(summary, SUMMARY_UNAVAILABLE);

        let analyzer = SensitivityAnalyzer::new(ScriptedClient::replying("Three year term."));
        let summary = analyzer.summarize_agreement("Agreement text").await.expect("summary");
        assert_eq!(summary, "Three year term.");
    }
}
