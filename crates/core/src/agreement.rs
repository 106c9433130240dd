use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::request::{PricingRequest, RequestId};
use crate::errors::DomainError;

pub const AGREEMENT_TITLE: &str = "Pricing Agreement";
pub const DEFAULT_COMPANY_NAME: &str = "FedEx";

pub fn default_placeholder_expiration() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MAX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgreementDefaults {
    pub company_name: String,
    pub placeholder_expiration: NaiveDate,
}

impl Default for AgreementDefaults {
    fn default() -> Self {
        Self {
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            placeholder_expiration: default_placeholder_expiration(),
        }
    }
}

/// Everything an exported agreement shows, already formatted for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementDocument {
    pub title: String,
    pub request_id: RequestId,
    pub customer_name: String,
    pub region: String,
    pub total_contract_value: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_level: Option<String>,
    pub effective_date: NaiveDate,
    pub expiration_date: NaiveDate,
    pub terms: String,
    pub generated_on: NaiveDate,
}

impl AgreementDocument {
    /// Only Approved, In Agreement and Published requests can be exported.
    pub fn from_request(
        request: &PricingRequest,
        today: NaiveDate,
        defaults: &AgreementDefaults,
    ) -> Result<Self, DomainError> {
        if !request.status.is_agreement() {
            return Err(DomainError::NotExportable {
                request_id: request.id.clone(),
                status: request.status,
            });
        }

        Ok(Self {
            title: AGREEMENT_TITLE.to_string(),
            request_id: request.id.clone(),
            customer_name: request.customer_name.clone(),
            region: request.region.clone(),
            total_contract_value: format_currency(request.value),
            status: request.status.label().to_string(),
            service_level: request.service_level.clone(),
            effective_date: request.effective_date.unwrap_or(today),
            expiration_date: request.expiration_date.unwrap_or(defaults.placeholder_expiration),
            terms: agreement_terms(&defaults.company_name),
            generated_on: today,
        })
    }

    pub fn file_name(&self) -> String {
        file_name_for(&self.request_id)
    }
}

pub fn file_name_for(request_id: &RequestId) -> String {
    format!("Agreement_{request_id}.pdf")
}

pub fn agreement_terms(company_name: &str) -> String {
    format!(
        "This pricing agreement is entered into between {company_name} and the Customer \
         identified above. The rates and discounts set forth herein are confidential and \
         subject to the Master Transportation Services Agreement. This agreement supersedes \
         all prior agreements regarding the services specified."
    )
}

/// `$1,234,567`; cents are shown only when present.
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded < Decimal::ZERO;
    let absolute = rounded.abs();
    let whole = absolute.trunc();
    let cents = ((absolute - whole) * Decimal::ONE_HUNDRED).trunc();

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    if cents.is_zero() {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{:0>2}", cents.to_string())
    }
}
