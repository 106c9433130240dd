use crate::agreement::{AgreementDefaults, AgreementDocument};
use crate::clock::{Clock, SystemClock};
use crate::domain::actor::{Actor, ActorDirectory};
use crate::domain::request::{DraftFields, PricingRequest, RequestId, RequestStatus};
use crate::errors::{ApplicationError, DomainError};
use crate::fixtures;
use crate::query::{self, DashboardSummary};
use crate::store::RequestStore;
use crate::workflow::{TransitionOutcome, WorkflowEngine};

/// One pricing desk: the roster, the request store and the engine that
/// mutates it. Every operation names the acting actor by id; the id is
/// resolved against the roster before anything else happens.
#[derive(Debug)]
pub struct Workspace<C = SystemClock> {
    directory: ActorDirectory,
    store: RequestStore,
    engine: WorkflowEngine<C>,
    agreement_defaults: AgreementDefaults,
}

impl Workspace<SystemClock> {
    pub fn demo() -> Result<Self, DomainError> {
        Workspace::with_demo_data(WorkflowEngine::default())
    }
}

impl<C> Workspace<C>
where
    C: Clock,
{
    pub fn new(directory: ActorDirectory, store: RequestStore, engine: WorkflowEngine<C>) -> Self {
        Self { directory, store, engine, agreement_defaults: AgreementDefaults::default() }
    }

    /// Demo roster with the demo requests already loaded.
    pub fn with_demo_data(engine: WorkflowEngine<C>) -> Result<Self, DomainError> {
        let store = RequestStore::seeded(fixtures::demo_requests())?;
        Ok(Self::new(fixtures::demo_directory(), store, engine))
    }

    pub fn with_agreement_defaults(mut self, defaults: AgreementDefaults) -> Self {
        self.agreement_defaults = defaults;
        self
    }

    pub fn directory(&self) -> &ActorDirectory {
        &self.directory
    }

    pub fn store(&self) -> &RequestStore {
        &self.store
    }

    pub fn engine(&self) -> &WorkflowEngine<C> {
        &self.engine
    }

    pub fn resolve_actor(&self, actor_id: &str) -> Result<&Actor, ApplicationError> {
        self.directory
            .find(actor_id.trim())
            .ok_or_else(|| ApplicationError::UnknownActor(actor_id.to_string()))
    }

    pub fn create_request(
        &mut self,
        actor_id: &str,
        fields: DraftFields,
    ) -> Result<PricingRequest, ApplicationError> {
        let actor = self.resolve_owned(actor_id)?;
        Ok(self.engine.create_request(&mut self.store, fields, &actor)?)
    }

    pub fn submit_transition(
        &mut self,
        actor_id: &str,
        request_id: &RequestId,
        to: RequestStatus,
    ) -> Result<TransitionOutcome, ApplicationError> {
        let actor = self.resolve_owned(actor_id)?;
        Ok(self.engine.submit_transition(&mut self.store, request_id, to, &actor)?)
    }

    pub fn replace_request(
        &mut self,
        actor_id: &str,
        updated: PricingRequest,
    ) -> Result<PricingRequest, ApplicationError> {
        let actor = self.resolve_owned(actor_id)?;
        Ok(self.engine.replace_request(&mut self.store, updated, &actor)?)
    }

    pub fn add_comment(
        &mut self,
        actor_id: &str,
        request_id: &RequestId,
        text: &str,
    ) -> Result<PricingRequest, ApplicationError> {
        let actor = self.resolve_owned(actor_id)?;
        Ok(self.engine.add_comment(&mut self.store, request_id, text, &actor)?)
    }

    pub fn visible_requests(
        &self,
        actor_id: &str,
        search_term: &str,
    ) -> Result<Vec<&PricingRequest>, ApplicationError> {
        let actor = self.resolve_actor(actor_id)?;
        Ok(query::visible_requests(self.store.iter(), actor, search_term))
    }

    /// A single request, subject to the same visibility rule as the list.
    pub fn request(
        &self,
        actor_id: &str,
        request_id: &RequestId,
    ) -> Result<&PricingRequest, ApplicationError> {
        let actor = self.resolve_actor(actor_id)?;
        let request = self.store.require(request_id)?;
        if !query::is_visible_to(request, actor) {
            return Err(DomainError::NotFound(request_id.clone()).into());
        }
        Ok(request)
    }

    pub fn available_transitions(
        &self,
        actor_id: &str,
        request_id: &RequestId,
    ) -> Result<Vec<RequestStatus>, ApplicationError> {
        let request = self.request(actor_id, request_id)?;
        let actor = self.resolve_actor(actor_id)?;
        Ok(self.engine.available_transitions(request, actor))
    }

    pub fn agreement_library(&self, search_term: &str) -> Vec<&PricingRequest> {
        query::agreement_library(self.store.iter(), search_term)
    }

    pub fn dashboard(&self) -> DashboardSummary {
        DashboardSummary::from_requests(self.store.iter())
    }

    pub fn agreement_document(
        &self,
        request_id: &RequestId,
    ) -> Result<AgreementDocument, ApplicationError> {
        let request = self.store.require(request_id)?;
        Ok(AgreementDocument::from_request(request, self.engine.today(), &self.agreement_defaults)?)
    }

    fn resolve_owned(&self, actor_id: &str) -> Result<Actor, ApplicationError> {
        self.resolve_actor(actor_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::Workspace;
    use crate::clock::FixedClock;
    use crate::domain::request::{DraftFields, RequestId, RequestStatus, RequestType};
    use crate::errors::{ApplicationError, DomainError};
    use crate::workflow::WorkflowEngine;

    fn workspace() -> Workspace<FixedClock> {
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).expect("valid date");
        Workspace::with_demo_data(WorkflowEngine::new(FixedClock(today))).expect("demo data")
    }

    #[test]
    fn unknown_actor_is_rejected_before_any_mutation() {
        let mut workspace = workspace();
        let fields = DraftFields {
            customer_name: "Acme".to_string(),
            region: "NAM".to_string(),
            value: Decimal::new(10, 0),
            request_type: RequestType::New,
        };

        let error = workspace.create_request("X9", fields).expect_err("unknown actor");
        assert_eq!(error, ApplicationError::UnknownActor("X9".to_string()));
        assert_eq!(workspace.store().len(), 5);
    }

    #[test]
    fn new_requests_continue_the_demo_sequence() {
        let mut workspace = workspace();
        let created = workspace
            .create_request(
                "S4",
                DraftFields {
                    customer_name: "Wayne Enterprises".to_string(),
                    region: "LATAM".to_string(),
                    value: Decimal::new(75_000, 0),
                    request_type: RequestType::SpotQuote,
                },
            )
            .expect("create");

        assert_eq!(created.id.as_str(), "PR-2024-006");
        let visible = workspace.visible_requests("S4", "").expect("list");
        assert_eq!(visible.first().map(|request| &request.id), Some(&created.id));
    }

    #[test]
    fn single_request_lookup_respects_visibility() {
        let workspace = workspace();
        let draft = RequestId::new("PR-2024-002");

        assert!(workspace.request("S1", &draft).is_ok());
        assert_eq!(
            workspace.request("P1", &draft),
            Err(ApplicationError::Domain(DomainError::NotFound(draft.clone())))
        );
    }

    #[test]
    fn available_transitions_follow_role_and_assignment() {
        let workspace = workspace();
        let umbrella = RequestId::new("PR-2024-003");

        assert_eq!(
            workspace.available_transitions("P1", &umbrella).expect("assigned analyst"),
            vec![RequestStatus::Approved, RequestStatus::Rejected]
        );
        assert!(workspace.available_transitions("P2", &umbrella).expect("other analyst").is_empty());
    }

    #[test]
    fn agreement_documents_come_from_agreement_requests_only() {
        let workspace = workspace();

        let document =
            workspace.agreement_document(&RequestId::new("PR-2024-005")).expect("published");
        assert_eq!(document.total_contract_value, "$2,100,000");
        assert_eq!(document.file_name(), "Agreement_PR-2024-005.pdf");

        assert!(matches!(
            workspace.agreement_document(&RequestId::new("PR-2024-001")),
            Err(ApplicationError::Domain(DomainError::NotExportable { .. }))
        ));
    }

    #[test]
    fn dashboard_reflects_demo_data() {
        let summary = workspace().dashboard();
        assert_eq!(summary.total_requests, 5);
        assert_eq!(summary.pending_approvals, 2);
        assert_eq!(summary.agreements_published, 1);
    }
}
