use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::actor::ActorId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds `<prefix>-<year>-<sequence>` with the sequence padded to three digits.
    pub fn compose(prefix: &str, year: i32, sequence: u32) -> Self {
        Self(format!("{prefix}-{year}-{sequence:03}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing numeric segment of the id, if it has one.
    pub fn sequence(&self) -> Option<u32> {
        self.0.rsplit_once('-').and_then(|(_, tail)| tail.parse().ok())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    SalesReview,
    PricingReview,
    Approved,
    InAgreement,
    Published,
    Rejected,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 7] = [
        Self::Draft,
        Self::SalesReview,
        Self::PricingReview,
        Self::Approved,
        Self::InAgreement,
        Self::Published,
        Self::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::SalesReview => "sales_review",
            Self::PricingReview => "pricing_review",
            Self::Approved => "approved",
            Self::InAgreement => "in_agreement",
            Self::Published => "published",
            Self::Rejected => "rejected",
        }
    }

    /// Human-facing label used in documents and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::SalesReview => "Sales Review",
            Self::PricingReview => "Pricing Review",
            Self::Approved => "Approved",
            Self::InAgreement => "In Agreement",
            Self::Published => "Published",
            Self::Rejected => "Rejected",
        }
    }

    /// Terminal by convention: the engine offers no edge out of these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Rejected)
    }

    pub fn is_agreement(&self) -> bool {
        matches!(self, Self::Approved | Self::InAgreement | Self::Published)
    }

    pub fn is_pending_review(&self) -> bool {
        matches!(self, Self::SalesReview | Self::PricingReview)
    }

    /// States in which no analyst may be assigned yet.
    pub fn precedes_assignment(&self) -> bool {
        matches!(self, Self::Draft | Self::SalesReview)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

fn normalize_key(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

impl FromStr for RequestStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(value);
        Self::ALL.into_iter().find(|status| status.as_str() == key).ok_or_else(|| UnknownVariant {
            kind: "request status",
            value: value.to_string(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    New,
    Renewal,
    SpotQuote,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Renewal => "renewal",
            Self::SpotQuote => "spot_quote",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Renewal => "Renewal",
            Self::SpotQuote => "Spot Quote",
        }
    }
}

impl FromStr for RequestType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize_key(value).as_str() {
            "new" => Ok(Self::New),
            "renewal" => Ok(Self::Renewal),
            "spot_quote" | "spot" => Ok(Self::SpotQuote),
            _ => Err(UnknownVariant { kind: "request type", value: value.to_string() }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author: ActorId,
    pub text: String,
    pub date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRequest {
    pub id: RequestId,
    pub customer_name: String,
    pub region: String,
    pub value: Decimal,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub submitted_date: NaiveDate,
    pub sales_rep_id: ActorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_analyst_id: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl PricingRequest {
    pub fn is_owned_by(&self, actor: &ActorId) -> bool {
        &self.sales_rep_id == actor
    }

    pub fn is_assigned_to(&self, actor: &ActorId) -> bool {
        self.pricing_analyst_id.as_ref() == Some(actor)
    }

    /// Case-insensitive substring match against customer name or id. The term
    /// is used as given; only the empty string matches everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.customer_name.to_lowercase().contains(&needle)
            || self.id.as_str().to_lowercase().contains(&needle)
    }
}

/// Caller-supplied fields for a new request; everything else is defaulted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFields {
    pub customer_name: String,
    pub region: String,
    pub value: Decimal,
    pub request_type: RequestType,
}
