use super::store_harness::{temp_store, user};
use campuslink::error::StoreError;
use campuslink::model::{CompanyProfile, Role};
use campuslink::search::{SearchAggregator, SearchScope};
use campuslink::store::{CompanyStore, UserStore};
use async_trait::async_trait;
use std::sync::Arc;

/// A company backend that is down. The aggregator must degrade the
/// category, not the search.
struct BrokenCompanyStore;

#[async_trait]
impl CompanyStore for BrokenCompanyStore {
    async fn upsert_company(&self, _company: &CompanyProfile) -> Result<(), StoreError> {
        Err(StoreError::Sqlite("backend down".into()))
    }

    async fn search_companies(
        &self,
        _query: &str,
        _limit: u32,
    ) -> Result<Vec<CompanyProfile>, StoreError> {
        Err(StoreError::Sqlite("backend down".into()))
    }
}

#[tokio::test]
async fn a_failing_category_degrades_to_empty_without_failing_the_search() {
    let (_tmp, store) = temp_store();
    let mut alice = user("u-alice", Role::Student, &[]);
    alice.first_name = "Alice".into();
    store.upsert_user(&alice).await.unwrap();

    let aggregator = SearchAggregator::new(store, Arc::new(BrokenCompanyStore));
    let results = aggregator.search("alice", SearchScope::All, 10).await.unwrap();

    assert_eq!(results.students.len(), 1);
    assert!(results.companies.is_empty());
    assert_eq!(results.total_results, 1);
}

#[tokio::test]
async fn a_failing_category_outside_the_scope_is_never_consulted() {
    let (_tmp, store) = temp_store();
    let mut alice = user("u-alice", Role::Student, &[]);
    alice.first_name = "Alice".into();
    store.upsert_user(&alice).await.unwrap();

    let aggregator = SearchAggregator::new(store, Arc::new(BrokenCompanyStore));
    let results = aggregator
        .search("alice", SearchScope::Students, 10)
        .await
        .unwrap();
    assert_eq!(results.students.len(), 1);
    assert_eq!(results.total_results, 1);
}
