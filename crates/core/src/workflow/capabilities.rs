//! Role → permitted edge mapping for the pricing-request lifecycle.
//!
//! Every status change the workflow accepts is a row in [`CapabilityTable`].
//! Both the guarded transition operation and the full edit consult the same
//! table through [`CapabilityTable::authorize`], so the role checks live in one
//! place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actor::{Actor, Role};
use crate::domain::request::{PricingRequest, RequestStatus};

/// Which operation an edge is reachable through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Review and decision steps, taken with `submit_transition`.
    Workflow,
    /// Agreement finalization, taken through the full edit.
    Agreement,
}

/// Identity constraint an actor must satisfy on top of the role requirement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    OwningSalesRep,
    AnyPricingAnalyst,
    AssignedAnalyst,
    /// The owning sales rep or the assigned analyst.
    Participant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionEffect {
    AssignActingAnalyst,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub kind: EdgeKind,
    pub role: Option<Role>,
    pub guard: Guard,
    pub effects: Vec<TransitionEffect>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionRejection {
    #[error("no such edge in the workflow")]
    NoSuchEdge,
    #[error("edge requires role {required}")]
    RoleNotPermitted { required: Role },
    #[error("actor does not own the request")]
    NotRequestOwner,
    #[error("actor is not the assigned pricing analyst")]
    NotAssignedAnalyst,
    #[error("actor is neither the owning sales rep nor the assigned analyst")]
    NotParticipant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilityTable {
    rules: Vec<TransitionRule>,
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl CapabilityTable {
    pub fn new(rules: Vec<TransitionRule>) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        use EdgeKind::{Agreement, Workflow};
        use RequestStatus::{
            Approved, Draft, InAgreement, PricingReview, Published, Rejected, SalesReview,
        };

        let rule = |from, to, kind, role, guard, effects| TransitionRule {
            from,
            to,
            kind,
            role,
            guard,
            effects,
        };

        Self::new(vec![
            rule(
                Draft,
                SalesReview,
                Workflow,
                Some(Role::SalesRep),
                Guard::OwningSalesRep,
                Vec::new(),
            ),
            rule(
                SalesReview,
                PricingReview,
                Workflow,
                Some(Role::PricingAnalyst),
                Guard::AnyPricingAnalyst,
                vec![TransitionEffect::AssignActingAnalyst],
            ),
            rule(
                PricingReview,
                Approved,
                Workflow,
                Some(Role::PricingAnalyst),
                Guard::AssignedAnalyst,
                Vec::new(),
            ),
            rule(
                PricingReview,
                Rejected,
                Workflow,
                Some(Role::PricingAnalyst),
                Guard::AssignedAnalyst,
                Vec::new(),
            ),
            rule(Approved, InAgreement, Agreement, None, Guard::Participant, Vec::new()),
            rule(InAgreement, Published, Agreement, None, Guard::Participant, Vec::new()),
        ])
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    pub fn rule(
        &self,
        from: RequestStatus,
        to: RequestStatus,
        kind: EdgeKind,
    ) -> Option<&TransitionRule> {
        self.rules.iter().find(|rule| rule.from == from && rule.to == to && rule.kind == kind)
    }

    /// Resolves the rule that lets `actor` move `request` to `to`.
    pub fn authorize(
        &self,
        request: &PricingRequest,
        to: RequestStatus,
        actor: &Actor,
        kind: EdgeKind,
    ) -> Result<&TransitionRule, TransitionRejection> {
        let rule = self.rule(request.status, to, kind).ok_or(TransitionRejection::NoSuchEdge)?;

        if let Some(required) = rule.role {
            if actor.role != required {
                return Err(TransitionRejection::RoleNotPermitted { required });
            }
        }

        match rule.guard {
            Guard::OwningSalesRep if !request.is_owned_by(&actor.id) => {
                Err(TransitionRejection::NotRequestOwner)
            }
            Guard::AssignedAnalyst if !request.is_assigned_to(&actor.id) => {
                Err(TransitionRejection::NotAssignedAnalyst)
            }
            Guard::Participant
                if !request.is_owned_by(&actor.id) && !request.is_assigned_to(&actor.id) =>
            {
                Err(TransitionRejection::NotParticipant)
            }
            _ => Ok(rule),
        }
    }

    /// Targets `actor` could move `request` to right now through edges of `kind`.
    pub fn available_targets(
        &self,
        request: &PricingRequest,
        actor: &Actor,
        kind: EdgeKind,
    ) -> Vec<RequestStatus> {
        self.rules
            .iter()
            .filter(|rule| rule.from == request.status && rule.kind == kind)
            .filter(|rule| self.authorize(request, rule.to, actor, kind).is_ok())
            .map(|rule| rule.to)
            .collect()
    }
}
