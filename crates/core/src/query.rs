//! Read-only, role-scoped views over the request store.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::actor::{Actor, Role};
use crate::domain::request::{PricingRequest, RequestStatus};

/// Sales reps see their own requests; analysts see everything past `Draft`.
pub fn is_visible_to(request: &PricingRequest, actor: &Actor) -> bool {
    match actor.role {
        Role::SalesRep => request.is_owned_by(&actor.id),
        Role::PricingAnalyst => request.status != RequestStatus::Draft,
    }
}

pub fn visible_requests<'a, I>(
    requests: I,
    actor: &Actor,
    search_term: &str,
) -> Vec<&'a PricingRequest>
where
    I: IntoIterator<Item = &'a PricingRequest>,
{
    requests
        .into_iter()
        .filter(|request| is_visible_to(request, actor))
        .filter(|request| request.matches_search(search_term))
        .collect()
}

/// Requests that have become agreements, regardless of who is looking.
pub fn agreement_library<'a, I>(requests: I, search_term: &str) -> Vec<&'a PricingRequest>
where
    I: IntoIterator<Item = &'a PricingRequest>,
{
    requests
        .into_iter()
        .filter(|request| request.status.is_agreement())
        .filter(|request| request.matches_search(search_term))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_requests: usize,
    pub pending_approvals: usize,
    pub agreements_published: usize,
    pub pipeline_value: Decimal,
    pub by_status: BTreeMap<String, usize>,
}

impl DashboardSummary {
    pub fn from_requests<'a, I>(requests: I) -> Self
    where
        I: IntoIterator<Item = &'a PricingRequest>,
    {
        let mut by_status: BTreeMap<String, usize> =
            RequestStatus::ALL.iter().map(|status| (status.as_str().to_string(), 0)).collect();
        let mut summary = Self {
            total_requests: 0,
            pending_approvals: 0,
            agreements_published: 0,
            pipeline_value: Decimal::ZERO,
            by_status: BTreeMap::new(),
        };

        for request in requests {
            summary.total_requests += 1;
            *by_status.entry(request.status.as_str().to_string()).or_insert(0) += 1;

            if request.status.is_pending_review() {
                summary.pending_approvals += 1;
            }
            if matches!(request.status, RequestStatus::Published | RequestStatus::Approved) {
                summary.agreements_published += 1;
            }
            if request.status != RequestStatus::Rejected {
                summary.pipeline_value = summary.pipeline_value.saturating_add(request.value);
            }
        }

        summary.by_status = by_status;
        summary
    }
}
