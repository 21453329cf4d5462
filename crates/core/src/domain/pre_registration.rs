use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::facility::FacilityId;

/// One recorded, non-binding pre-registration. The detail row is written in
/// the same transaction as the aggregate ledger increment so the two never
/// drift apart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreRegistration {
    pub id: Uuid,
    pub kennzahl: FacilityId,
    pub parent_name: String,
    pub parent_email: String,
    pub child_name: String,
    pub created_at: DateTime<Utc>,
}
