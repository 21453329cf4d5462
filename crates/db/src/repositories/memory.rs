use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use platzbot_core::domain::facility::{Facility, FacilityId};
use platzbot_core::domain::pre_registration::PreRegistration;

use super::{FacilityStore, RepositoryError};

/// In-memory capacity store for executor and assembler tests. The reserve
/// check-then-increment runs under one write lock, which gives it the same
/// single-unit guarantee as the SQL implementation's conditional update.
#[derive(Default)]
pub struct InMemoryFacilityStore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    facilities: HashMap<i64, Facility>,
    records: Vec<PreRegistration>,
}

impl InMemoryFacilityStore {
    pub async fn insert(&self, facility: Facility) {
        let mut state = self.state.write().await;
        state.facilities.insert(facility.kennzahl.0, facility);
    }

    pub async fn records(&self) -> Vec<PreRegistration> {
        self.state.read().await.records.clone()
    }
}

#[async_trait::async_trait]
impl FacilityStore for InMemoryFacilityStore {
    async fn find_facilities(&self, query: &str) -> Result<Vec<Facility>, RepositoryError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let compact: String = trimmed.chars().filter(|ch| !ch.is_whitespace()).collect();
        let is_postal_code = compact.chars().all(|ch| ch.is_ascii_digit());
        let needle = trimmed.to_lowercase();

        let state = self.state.read().await;
        let mut matches: Vec<Facility> = state
            .facilities
            .values()
            .filter(|facility| {
                if is_postal_code {
                    facility.postal_code.as_deref() == Some(compact.as_str())
                } else {
                    facility
                        .city
                        .as_deref()
                        .map(|city| city.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                }
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.city.cmp(&b.city).then_with(|| a.name.cmp(&b.name)));
        Ok(matches)
    }

    async fn facility_by_id(
        &self,
        kennzahl: FacilityId,
    ) -> Result<Option<Facility>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.facilities.get(&kennzahl.0).cloned())
    }

    async fn free_places(&self, kennzahl: FacilityId) -> Result<Option<i64>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.facilities.get(&kennzahl.0).map(Facility::free_places))
    }

    async fn reserve(
        &self,
        kennzahl: FacilityId,
        parent_name: &str,
        parent_email: &str,
        child_name: &str,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(facility) = state.facilities.get_mut(&kennzahl.0) else {
            return Ok(false);
        };
        if facility.free_places() <= 0 {
            return Ok(false);
        }

        facility.ledger.pre_registrations =
            Some(facility.ledger.pre_registrations.unwrap_or(0) + 1);
        state.records.push(PreRegistration {
            id: Uuid::new_v4(),
            kennzahl,
            parent_name: parent_name.to_string(),
            parent_email: parent_email.to_string(),
            child_name: child_name.to_string(),
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn reset_pre_registrations(
        &self,
        city: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        let mut state = self.state.write().await;
        let mut touched = 0u64;
        let mut kept_kennzahlen = Vec::new();

        for facility in state.facilities.values_mut() {
            let in_scope = match city {
                Some(city) => facility
                    .city
                    .as_deref()
                    .map(|own| own.eq_ignore_ascii_case(city))
                    .unwrap_or(false),
                None => true,
            };
            if in_scope {
                facility.ledger.pre_registrations = Some(0);
                touched += 1;
            } else {
                kept_kennzahlen.push(facility.kennzahl);
            }
        }

        state.records.retain(|record| kept_kennzahlen.contains(&record.kennzahl));
        Ok(touched)
    }
}
