use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique facility identifier ("Kennzahl") assigned by the state registry.
/// Immutable once created; all lookups and ledger mutations key on it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FacilityId(pub i64);

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-facility capacity bookkeeping. All three fields are nullable in the
/// source dataset; a missing value counts as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityLedger {
    pub capacity_estimate: Option<i64>,
    pub current_occupancy: Option<i64>,
    pub pre_registrations: Option<i64>,
}

impl CapacityLedger {
    /// Derived available capacity, clamped so it never goes negative.
    pub fn free_places(&self) -> i64 {
        let capacity = self.capacity_estimate.unwrap_or(0);
        let occupancy = self.current_occupancy.unwrap_or(0);
        let pre_registrations = self.pre_registrations.unwrap_or(0);
        (capacity - occupancy - pre_registrations).max(0)
    }
}

/// One childcare establishment. Read-only from the core's perspective except
/// for the ledger, which is mutated through the store's reserve/reset
/// operations only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub kennzahl: FacilityId,
    pub name: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub ledger: CapacityLedger,
}

impl Facility {
    pub fn free_places(&self) -> i64 {
        self.ledger.free_places()
    }
}
