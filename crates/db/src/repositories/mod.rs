use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use platzbot_core::domain::facility::{Facility, FacilityId};
use platzbot_core::domain::pre_registration::PreRegistration;

pub mod facility;
pub mod memory;
pub mod pre_registration;

pub use facility::SqlFacilityRepository;
pub use memory::InMemoryFacilityStore;
pub use pre_registration::SqlPreRegistrationReports;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// The capacity store: all reads and ledger mutations go through this trait.
/// Reads are uncached and mutations write through immediately, so capacity
/// changes are visible to the next reservation attempt.
#[async_trait]
pub trait FacilityStore: Send + Sync {
    /// Search by locality name or postal code. A purely numeric query is an
    /// exact postal-code match; anything else matches the city name exactly
    /// (case-insensitive) or as a substring. Results are ordered by city,
    /// then name. An empty or whitespace query yields an empty list.
    async fn find_facilities(&self, query: &str) -> Result<Vec<Facility>, RepositoryError>;

    async fn facility_by_id(
        &self,
        kennzahl: FacilityId,
    ) -> Result<Option<Facility>, RepositoryError>;

    /// Clamped free places, `None` for an unknown facility.
    async fn free_places(&self, kennzahl: FacilityId) -> Result<Option<i64>, RepositoryError>;

    /// Attempts one reservation. Returns false without any mutation when the
    /// facility is unknown or has no free places left. The capacity check
    /// and the ledger increment are observed by the store as a single unit:
    /// two concurrent attempts against one remaining place cannot both
    /// succeed.
    async fn reserve(
        &self,
        kennzahl: FacilityId,
        parent_name: &str,
        parent_email: &str,
        child_name: &str,
    ) -> Result<bool, RepositoryError>;

    /// Zeroes `pre_registrations` for every facility, or only for one city
    /// (case-insensitive) when given. Test/demo use. Returns the number of
    /// facilities touched.
    async fn reset_pre_registrations(&self, city: Option<&str>)
        -> Result<u64, RepositoryError>;
}

/// One pre-registration joined with its facility, for reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreRegistrationEntry {
    pub record: PreRegistration,
    pub facility_name: String,
    pub city: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacilityCount {
    pub kennzahl: FacilityId,
    pub name: String,
    pub city: Option<String>,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CityCount {
    pub city: Option<String>,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreRegistrationSummary {
    pub since: DateTime<Utc>,
    pub total: i64,
    pub by_facility: Vec<FacilityCount>,
    pub by_city: Vec<CityCount>,
}

/// Read-only reporting over the pre-registration detail rows.
#[async_trait]
pub trait PreRegistrationReports: Send + Sync {
    async fn recent(&self, limit: u32) -> Result<Vec<PreRegistrationEntry>, RepositoryError>;
    async fn summary_since_days(
        &self,
        days: u32,
    ) -> Result<PreRegistrationSummary, RepositoryError>;
}
