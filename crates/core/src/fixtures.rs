//! Demo roster and requests loaded by `pricedesk seed` and by the server when
//! `workflow.seed_demo_data` is enabled.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::actor::{Actor, ActorDirectory, ActorId, Role};
use crate::domain::request::{PricingRequest, RequestId, RequestStatus, RequestType};

pub fn demo_actors() -> Vec<Actor> {
    vec![
        Actor::new("S1", "Sarah Sales", Role::SalesRep),
        Actor::new("S2", "Steve Seller", Role::SalesRep),
        Actor::new("S3", "Sam Strategist", Role::SalesRep),
        Actor::new("S4", "Sandy Spot", Role::SalesRep),
        Actor::new("S5", "Saul Closer", Role::SalesRep),
        Actor::new("P1", "Pat Pricing", Role::PricingAnalyst),
        Actor::new("P2", "Penny Profit", Role::PricingAnalyst),
        Actor::new("P3", "Peter Planner", Role::PricingAnalyst),
        Actor::new("P4", "Polly Predictor", Role::PricingAnalyst),
        Actor::new("P5", "Paul Process", Role::PricingAnalyst),
    ]
}

pub fn demo_directory() -> ActorDirectory {
    ActorDirectory::new(demo_actors())
}

/// Demo requests, most recent first.
pub fn demo_requests() -> Vec<PricingRequest> {
    vec![
        DemoRequest {
            id: "PR-2024-001",
            customer: "Globex Logistics",
            status: RequestStatus::SalesReview,
            request_type: RequestType::Renewal,
            value: 450_000,
            submitted: (2023, 10, 24),
            region: "APAC",
            sales_rep: "S1",
            analyst: None,
            service_level: Some("International Priority"),
            term: None,
        }
        .build(),
        DemoRequest {
            id: "PR-2024-002",
            customer: "Soylent Corp",
            status: RequestStatus::Draft,
            request_type: RequestType::New,
            value: 120_000,
            submitted: (2023, 10, 25),
            region: "NAM",
            sales_rep: "S1",
            analyst: None,
            service_level: None,
            term: None,
        }
        .build(),
        DemoRequest {
            id: "PR-2024-003",
            customer: "Umbrella Inc",
            status: RequestStatus::PricingReview,
            request_type: RequestType::SpotQuote,
            value: 25_000,
            submitted: (2023, 10, 25),
            region: "EMEA",
            sales_rep: "S2",
            analyst: Some("P1"),
            service_level: None,
            term: None,
        }
        .build(),
        DemoRequest {
            id: "PR-2024-004",
            customer: "Initech",
            status: RequestStatus::InAgreement,
            request_type: RequestType::Renewal,
            value: 890_000,
            submitted: (2023, 10, 23),
            region: "NAM",
            sales_rep: "S3",
            analyst: Some("P2"),
            service_level: Some("Priority Overnight"),
            term: Some(((2023, 11, 1), (2026, 11, 1))),
        }
        .build(),
        DemoRequest {
            id: "PR-2024-005",
            customer: "Cyberdyne",
            status: RequestStatus::Published,
            request_type: RequestType::New,
            value: 2_100_000,
            submitted: (2023, 10, 20),
            region: "APAC",
            sales_rep: "S1",
            analyst: Some("P1"),
            service_level: Some("Ground"),
            term: Some(((2023, 10, 20), (2025, 10, 20))),
        }
        .build(),
    ]
}

type Ymd = (i32, u32, u32);

struct DemoRequest {
    id: &'static str,
    customer: &'static str,
    status: RequestStatus,
    request_type: RequestType,
    value: i64,
    submitted: Ymd,
    region: &'static str,
    sales_rep: &'static str,
    analyst: Option<&'static str>,
    service_level: Option<&'static str>,
    term: Option<(Ymd, Ymd)>,
}

impl DemoRequest {
    fn build(self) -> PricingRequest {
        PricingRequest {
            id: RequestId::new(self.id),
            customer_name: self.customer.to_string(),
            region: self.region.to_string(),
            value: Decimal::new(self.value, 0),
            request_type: self.request_type,
            status: self.status,
            submitted_date: ymd(self.submitted),
            sales_rep_id: ActorId::new(self.sales_rep),
            pricing_analyst_id: self.analyst.map(ActorId::new),
            service_level: self.service_level.map(str::to_string),
            effective_date: self.term.map(|(effective, _)| ymd(effective)),
            expiration_date: self.term.map(|(_, expiration)| ymd(expiration)),
            comments: Vec::new(),
        }
    }
}

fn ymd((year, month, day): Ymd) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}
