use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::domain::actor::{Actor, Role};
use crate::domain::request::{Comment, DraftFields, PricingRequest, RequestId, RequestStatus};
use crate::errors::DomainError;
use crate::query::is_visible_to;
use crate::store::RequestStore;
use crate::workflow::capabilities::{CapabilityTable, EdgeKind, TransitionEffect};

pub const DEFAULT_ID_PREFIX: &str = "PR";

/// Largest deal value a request may carry: one trillion dollars.
pub const MAX_REQUEST_VALUE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub request_id: RequestId,
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub effects: Vec<TransitionEffect>,
    pub request: PricingRequest,
}

/// Validates and applies every mutation of the request store.
///
/// Each operation either fully succeeds or leaves the store untouched.
#[derive(Clone, Debug)]
pub struct WorkflowEngine<C = SystemClock> {
    capabilities: CapabilityTable,
    clock: C,
    id_prefix: String,
    id_year: Option<i32>,
}

impl Default for WorkflowEngine<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C> WorkflowEngine<C>
where
    C: Clock,
{
    pub fn new(clock: C) -> Self {
        Self {
            capabilities: CapabilityTable::standard(),
            clock,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            id_year: None,
        }
    }

    pub fn with_capabilities(mut self, capabilities: CapabilityTable) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    /// Pins the year segment of minted ids instead of using the current year.
    pub fn with_id_year(mut self, year: Option<i32>) -> Self {
        self.id_year = year;
        self
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    pub fn create_request(
        &self,
        store: &mut RequestStore,
        fields: DraftFields,
        actor: &Actor,
    ) -> Result<PricingRequest, DomainError> {
        if actor.role != Role::SalesRep {
            return Err(unauthorized(actor, "create pricing requests"));
        }

        let customer_name = required_text("customerName", &fields.customer_name)?;
        let region = required_text("region", &fields.region)?;
        ensure_value_in_range(fields.value)?;

        let today = self.clock.today();
        let year = self.id_year.unwrap_or_else(|| today.year());
        let request = PricingRequest {
            id: store.next_id(&self.id_prefix, year),
            customer_name,
            region,
            value: fields.value,
            request_type: fields.request_type,
            status: RequestStatus::Draft,
            submitted_date: today,
            sales_rep_id: actor.id.clone(),
            pricing_analyst_id: None,
            service_level: None,
            effective_date: None,
            expiration_date: None,
            comments: Vec::new(),
        };

        store.insert(request.clone())?;
        Ok(request)
    }

    /// Computes the record a workflow transition would produce without
    /// touching any store.
    pub fn plan_transition(
        &self,
        request: &PricingRequest,
        to: RequestStatus,
        actor: &Actor,
    ) -> Result<TransitionOutcome, DomainError> {
        let rule = self
            .capabilities
            .authorize(request, to, actor, EdgeKind::Workflow)
            .map_err(|reason| DomainError::InvalidTransition {
                request_id: request.id.clone(),
                from: request.status,
                to,
                reason,
            })?;

        let mut updated = request.clone();
        updated.status = to;
        for effect in &rule.effects {
            match effect {
                TransitionEffect::AssignActingAnalyst => {
                    updated.pricing_analyst_id = Some(actor.id.clone());
                }
            }
        }

        Ok(TransitionOutcome {
            request_id: request.id.clone(),
            from: request.status,
            to,
            effects: rule.effects.clone(),
            request: updated,
        })
    }

    pub fn submit_transition(
        &self,
        store: &mut RequestStore,
        request_id: &RequestId,
        to: RequestStatus,
        actor: &Actor,
    ) -> Result<TransitionOutcome, DomainError> {
        let outcome = self.plan_transition(store.require(request_id)?, to, actor)?;
        store.replace(outcome.request.clone())?;
        Ok(outcome)
    }

    /// Full-record edit.
    ///
    /// Descriptive and agreement fields may change freely. Identity, ownership
    /// and assignment are fixed, comments may only grow, and a status change is
    /// accepted only along an agreement edge the actor is entitled to.
    pub fn replace_request(
        &self,
        store: &mut RequestStore,
        updated: PricingRequest,
        actor: &Actor,
    ) -> Result<PricingRequest, DomainError> {
        let current = store.require(&updated.id)?;

        if !is_visible_to(current, actor) {
            return Err(unauthorized(actor, "edit this pricing request"));
        }

        ensure_unchanged(current, "salesRepId", current.sales_rep_id == updated.sales_rep_id)?;
        ensure_unchanged(
            current,
            "submittedDate",
            current.submitted_date == updated.submitted_date,
        )?;
        ensure_unchanged(
            current,
            "pricingAnalystId",
            current.pricing_analyst_id == updated.pricing_analyst_id,
        )?;

        let mut next = updated;
        ensure_appended_comments(current, &mut next.comments, actor, self.clock.today())?;
        next.customer_name = required_text("customerName", &next.customer_name)?;
        next.region = required_text("region", &next.region)?;
        ensure_value_in_range(next.value)?;
        next.service_level = next
            .service_level
            .map(|level| level.trim().to_string())
            .filter(|level| !level.is_empty());
        if let (Some(effective), Some(expiration)) = (next.effective_date, next.expiration_date) {
            if expiration < effective {
                return Err(DomainError::invalid_field(
                    "expirationDate",
                    format!("{expiration} precedes effective date {effective}"),
                ));
            }
        }

        if next.status != current.status {
            self.capabilities.authorize(current, next.status, actor, EdgeKind::Agreement).map_err(
                |reason| DomainError::InvalidTransition {
                    request_id: current.id.clone(),
                    from: current.status,
                    to: next.status,
                    reason,
                },
            )?;
        }

        store.replace(next.clone())?;
        Ok(next)
    }

    pub fn add_comment(
        &self,
        store: &mut RequestStore,
        request_id: &RequestId,
        text: &str,
        actor: &Actor,
    ) -> Result<PricingRequest, DomainError> {
        let current = store.require(request_id)?;
        if !is_visible_to(current, actor) {
            return Err(unauthorized(actor, "comment on this pricing request"));
        }

        let text = required_text("text", text)?;
        let mut next = current.clone();
        next.comments.push(Comment { author: actor.id.clone(), text, date: self.clock.today() });

        store.replace(next.clone())?;
        Ok(next)
    }

    /// Workflow targets the actor could choose for this request right now.
    pub fn available_transitions(
        &self,
        request: &PricingRequest,
        actor: &Actor,
    ) -> Vec<RequestStatus> {
        self.capabilities.available_targets(request, actor, EdgeKind::Workflow)
    }
}

fn unauthorized(actor: &Actor, operation: &'static str) -> DomainError {
    DomainError::UnauthorizedActor { actor: actor.id.clone(), role: actor.role, operation }
}

fn required_text(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid_field(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}

fn ensure_value_in_range(value: Decimal) -> Result<(), DomainError> {
    if value < Decimal::ZERO {
        return Err(DomainError::invalid_field("value", format!("{value} is negative")));
    }
    if value > MAX_REQUEST_VALUE {
        return Err(DomainError::invalid_field(
            "value",
            format!("{value} exceeds the maximum of {MAX_REQUEST_VALUE}"),
        ));
    }
    Ok(())
}

/// Comments already on the record are fixed. New entries must be the
/// actor's own, dated today and non-blank, the same shape `add_comment` writes.
fn ensure_appended_comments(
    current: &PricingRequest,
    comments: &mut [Comment],
    actor: &Actor,
    today: NaiveDate,
) -> Result<(), DomainError> {
    ensure_unchanged(current, "comments", comments.starts_with(&current.comments))?;

    for comment in &mut comments[current.comments.len()..] {
        if comment.author != actor.id {
            return Err(DomainError::invalid_field(
                "comments",
                format!("new comment is attributed to `{}`, not `{}`", comment.author, actor.id),
            ));
        }
        if comment.date != today {
            return Err(DomainError::invalid_field(
                "comments",
                format!("new comment is dated {}, expected {today}", comment.date),
            ));
        }
        comment.text = required_text("comments", &comment.text)?;
    }
    Ok(())
}

fn ensure_unchanged(
    current: &PricingRequest,
    field: &'static str,
    unchanged: bool,
) -> Result<(), DomainError> {
    if unchanged {
        Ok(())
    } else {
        Err(DomainError::ImmutableField { request_id: current.id.clone(), field })
    }
}
