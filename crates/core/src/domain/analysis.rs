use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Discount tiers the sensitivity report is expected to cover.
pub const SENSITIVITY_DISCOUNT_TIERS: [u8; 5] = [0, 5, 10, 15, 20];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityScenario {
    pub base_rate: Decimal,
    pub discount_percent: Decimal,
    pub competitor_rate: Decimal,
    pub annual_volume: u64,
    pub customer_segment: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityPoint {
    pub discount: f64,
    pub margin: f64,
    pub volume: f64,
    pub revenue: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub recommendation: String,
    pub risk_assessment: String,
    pub projected_margin: String,
    #[serde(default)]
    pub sensitivity_data: Vec<SensitivityPoint>,
}
