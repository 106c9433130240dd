use std::collections::HashMap;

use crate::domain::request::{PricingRequest, RequestId};
use crate::errors::DomainError;

/// In-memory pricing-request collection.
///
/// Records are kept in insertion order internally and enumerated
/// most-recent-first. There is no removal: once inserted, an id stays taken for
/// the lifetime of the store.
#[derive(Clone, Debug)]
pub struct RequestStore {
    requests: Vec<PricingRequest>,
    index: HashMap<RequestId, usize>,
    next_sequence: u32,
}

impl Default for RequestStore {
    fn default() -> Self {
        Self { requests: Vec::new(), index: HashMap::new(), next_sequence: 1 }
    }
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from records given most-recent-first, the order they are
    /// enumerated in afterwards.
    pub fn seeded(requests: Vec<PricingRequest>) -> Result<Self, DomainError> {
        let mut store = Self::new();
        for request in requests.into_iter().rev() {
            store.insert(request)?;
        }
        Ok(store)
    }

    /// The id the next created request will receive.
    pub fn next_id(&self, prefix: &str, year: i32) -> RequestId {
        RequestId::compose(prefix, year, self.next_sequence)
    }

    /// Adds a record at the head of the enumeration order.
    pub fn insert(&mut self, request: PricingRequest) -> Result<(), DomainError> {
        if self.index.contains_key(&request.id) {
            return Err(DomainError::DuplicateId(request.id));
        }

        if let Some(sequence) = request.id.sequence() {
            self.next_sequence = self.next_sequence.max(sequence.saturating_add(1));
        }

        self.index.insert(request.id.clone(), self.requests.len());
        self.requests.push(request);
        Ok(())
    }

    /// Swaps in a new version of an existing record, keeping its position.
    /// Returns the previous version.
    pub fn replace(&mut self, request: PricingRequest) -> Result<PricingRequest, DomainError> {
        let position =
            *self.index.get(&request.id).ok_or_else(|| DomainError::NotFound(request.id.clone()))?;
        Ok(std::mem::replace(&mut self.requests[position], request))
    }

    pub fn get(&self, id: &RequestId) -> Option<&PricingRequest> {
        self.index.get(id).map(|position| &self.requests[*position])
    }

    pub fn require(&self, id: &RequestId) -> Result<&PricingRequest, DomainError> {
        self.get(id).ok_or_else(|| DomainError::NotFound(id.clone()))
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.index.contains_key(id)
    }

    /// Most-recent-first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PricingRequest> + '_ {
        self.requests.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::RequestStore;
    use crate::domain::actor::ActorId;
    use crate::domain::request::{PricingRequest, RequestId, RequestStatus, RequestType};
    use crate::errors::DomainError;

    fn request(id: &str, customer: &str) -> PricingRequest {
        PricingRequest {
            id: RequestId::new(id),
            customer_name: customer.to_string(),
            region: "NAM".to_string(),
            value: Decimal::new(1_000, 0),
            request_type: RequestType::New,
            status: RequestStatus::Draft,
            submitted_date: NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date"),
            sales_rep_id: ActorId::new("S1"),
            pricing_analyst_id: None,
            service_level: None,
            effective_date: None,
            expiration_date: None,
            comments: Vec::new(),
        }
    }

    #[test]
    fn enumerates_most_recent_first() {
        let mut store = RequestStore::new();
        store.insert(request("PR-2024-001", "Acme")).expect("insert first");
        store.insert(request("PR-2024-002", "Globex")).expect("insert second");

        let ids: Vec<_> = store.iter().map(|request| request.id.as_str()).collect();
        assert_eq!(ids, vec!["PR-2024-002", "PR-2024-001"]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut store = RequestStore::new();
        store.insert(request("PR-2024-001", "Acme")).expect("insert");

        let error = store.insert(request("PR-2024-001", "Impostor")).expect_err("duplicate");
        assert_eq!(error, DomainError::DuplicateId(RequestId::new("PR-2024-001")));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&RequestId::new("PR-2024-001")).map(|r| r.customer_name.as_str()),
            Some("Acme")
        );
    }

    #[test]
    fn replace_keeps_position_and_requires_existing_id() {
        let mut store = RequestStore::seeded(vec![
            request("PR-2024-002", "Globex"),
            request("PR-2024-001", "Acme"),
        ])
        .expect("seed");

        let mut updated = request("PR-2024-001", "Acme Holdings");
        updated.region = "EMEA".to_string();
        let previous = store.replace(updated).expect("replace");
        assert_eq!(previous.customer_name, "Acme");

        let names: Vec<_> = store.iter().map(|request| request.customer_name.as_str()).collect();
        assert_eq!(names, vec!["Globex", "Acme Holdings"]);

        let error = store.replace(request("PR-2024-099", "Ghost")).expect_err("missing id");
        assert_eq!(error, DomainError::NotFound(RequestId::new("PR-2024-099")));
    }

    #[test]
    fn sequence_advances_past_seeded_ids() {
        let store = RequestStore::seeded(vec![
            request("PR-2024-005", "Cyberdyne"),
            request("PR-2024-002", "Soylent"),
        ])
        .expect("seed");

        assert_eq!(store.next_id("PR", 2024).as_str(), "PR-2024-006");
        assert_eq!(RequestStore::new().next_id("PR", 2024).as_str(), "PR-2024-001");
    }
}
