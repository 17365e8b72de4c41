//! Federated entity search: one query fanned out to independent
//! categories, merged without cross-category ranking.
//!
//! Each category is fault-isolated: a failing backend degrades that
//! category to an empty list instead of failing the whole search.

use crate::error::SearchError;
use crate::model::{CompanyProfile, Role, UserProfile};
use crate::store::{CompanyStore, UserStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SearchScope {
    Students,
    Alumni,
    Employers,
    Companies,
    #[default]
    All,
}

impl SearchScope {
    fn covers_role(self, role: Role) -> bool {
        matches!(
            (self, role),
            (Self::All, Role::Student | Role::Alumni | Role::Employer)
                | (Self::Students, Role::Student)
                | (Self::Alumni, Role::Alumni)
                | (Self::Employers, Role::Employer)
        )
    }

    fn covers_companies(self) -> bool {
        matches!(self, Self::All | Self::Companies)
    }
}

/// Merged result sets, keyed by category. `total_results` is the sum of
/// the list lengths, used for reporting only, never pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub total_results: u32,
    pub students: Vec<UserProfile>,
    pub alumni: Vec<UserProfile>,
    pub employers: Vec<UserProfile>,
    pub companies: Vec<CompanyProfile>,
}

pub struct SearchAggregator {
    users: Arc<dyn UserStore>,
    companies: Arc<dyn CompanyStore>,
}

impl SearchAggregator {
    pub fn new(users: Arc<dyn UserStore>, companies: Arc<dyn CompanyStore>) -> Self {
        Self { users, companies }
    }

    /// Run the query against every category the scope selects. Each
    /// category applies `limit` independently; no collaborator is
    /// touched when the trimmed query is empty.
    pub async fn search(
        &self,
        query: &str,
        scope: SearchScope,
        limit: u32,
    ) -> Result<SearchResults, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let students = self.user_category(scope, Role::Student, query, limit).await;
        let alumni = self.user_category(scope, Role::Alumni, query, limit).await;
        let employers = self.user_category(scope, Role::Employer, query, limit).await;

        let companies = if scope.covers_companies() {
            match self.companies.search_companies(query, limit).await {
                Ok(list) => list,
                Err(err) => {
                    tracing::warn!("company search degraded to empty: {err}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let total = students.len() + alumni.len() + employers.len() + companies.len();
        Ok(SearchResults {
            query: query.to_string(),
            total_results: u32::try_from(total).unwrap_or(u32::MAX),
            students,
            alumni,
            employers,
            companies,
        })
    }

    async fn user_category(
        &self,
        scope: SearchScope,
        role: Role,
        query: &str,
        limit: u32,
    ) -> Vec<UserProfile> {
        if !scope.covers_role(role) {
            return Vec::new();
        }
        match self.users.search_users(role, query, limit).await {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(%role, "user search degraded to empty: {err}");
                Vec::new()
            }
        }
    }
}
