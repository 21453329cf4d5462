use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use platzbot_core::domain::facility::{CapacityLedger, Facility, FacilityId};
use platzbot_core::text::clean_contact_field;

use super::{FacilityStore, RepositoryError};
use crate::DbPool;

const FACILITY_COLUMNS: &str = "kennzahl, name, city, postal_code, phone, email, website, \
     capacity_estimate, current_occupancy, pre_registrations";

pub struct SqlFacilityRepository {
    pool: DbPool,
}

impl SqlFacilityRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_facility(row: &sqlx::sqlite::SqliteRow) -> Result<Facility, RepositoryError> {
    let kennzahl: i64 =
        row.try_get("kennzahl").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let city: Option<String> =
        row.try_get("city").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let postal_code: Option<String> =
        row.try_get("postal_code").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let phone: Option<String> =
        row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: Option<String> =
        row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let website: Option<String> =
        row.try_get("website").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let capacity_estimate: Option<i64> =
        row.try_get("capacity_estimate").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let current_occupancy: Option<i64> =
        row.try_get("current_occupancy").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let pre_registrations: Option<i64> =
        row.try_get("pre_registrations").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Facility {
        kennzahl: FacilityId(kennzahl),
        name,
        city,
        postal_code,
        // Scraped contact fields can still carry markdown residue.
        phone: clean_contact_field(phone.as_deref()),
        email: clean_contact_field(email.as_deref()),
        website: clean_contact_field(website.as_deref()),
        ledger: CapacityLedger { capacity_estimate, current_occupancy, pre_registrations },
    })
}

#[async_trait::async_trait]
impl FacilityStore for SqlFacilityRepository {
    async fn find_facilities(&self, query: &str) -> Result<Vec<Facility>, RepositoryError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let compact: String = trimmed.chars().filter(|ch| !ch.is_whitespace()).collect();
        let is_postal_code = compact.chars().all(|ch| ch.is_ascii_digit());

        if is_postal_code {
            let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
                "SELECT {FACILITY_COLUMNS} FROM facility \
                 WHERE postal_code = ? ORDER BY city, name"
            ))
            .bind(&compact)
            .fetch_all(&self.pool)
            .await?;
            return rows.iter().map(row_to_facility).collect();
        }

        // SQLite's built-in lower() folds ASCII only, so the case-insensitive
        // city comparison happens here rather than in the WHERE clause.
        let needle = trimmed.to_lowercase();
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(&format!(
            "SELECT {FACILITY_COLUMNS} FROM facility \
             WHERE city IS NOT NULL ORDER BY city, name"
        ))
        .fetch_all(&self.pool)
        .await?;

        let facilities = rows.iter().map(row_to_facility).collect::<Result<Vec<_>, _>>()?;
        Ok(facilities
            .into_iter()
            .filter(|facility| {
                facility
                    .city
                    .as_deref()
                    .map(|city| city.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .collect())
    }

    async fn facility_by_id(
        &self,
        kennzahl: FacilityId,
    ) -> Result<Option<Facility>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {FACILITY_COLUMNS} FROM facility WHERE kennzahl = ?"
        ))
        .bind(kennzahl.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_facility(r)?)),
            None => Ok(None),
        }
    }

    async fn free_places(&self, kennzahl: FacilityId) -> Result<Option<i64>, RepositoryError> {
        let row = sqlx::query(
            "SELECT capacity_estimate, current_occupancy, pre_registrations \
             FROM facility WHERE kennzahl = ?",
        )
        .bind(kennzahl.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let ledger = CapacityLedger {
            capacity_estimate: row
                .try_get("capacity_estimate")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            current_occupancy: row
                .try_get("current_occupancy")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
            pre_registrations: row
                .try_get("pre_registrations")
                .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        };
        Ok(Some(ledger.free_places()))
    }

    async fn reserve(
        &self,
        kennzahl: FacilityId,
        parent_name: &str,
        parent_email: &str,
        child_name: &str,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Single conditional update: the WHERE clause recomputes free places,
        // so the check and the increment are one atomic statement and two
        // concurrent attempts at the last place cannot both pass.
        let updated = sqlx::query(
            "UPDATE facility \
             SET pre_registrations = COALESCE(pre_registrations, 0) + 1 \
             WHERE kennzahl = ? \
               AND COALESCE(capacity_estimate, 0) \
                   - COALESCE(current_occupancy, 0) \
                   - COALESCE(pre_registrations, 0) > 0",
        )
        .bind(kennzahl.0)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO pre_registration \
             (id, kennzahl, parent_name, parent_email, child_name, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(kennzahl.0)
        .bind(parent_name)
        .bind(parent_email)
        .bind(child_name)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn reset_pre_registrations(
        &self,
        city: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let touched = if let Some(city) = city {
            sqlx::query(
                "DELETE FROM pre_registration WHERE kennzahl IN \
                 (SELECT kennzahl FROM facility WHERE lower(city) = lower(?))",
            )
            .bind(city)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE facility SET pre_registrations = 0 WHERE lower(city) = lower(?)")
                .bind(city)
                .execute(&mut *tx)
                .await?
                .rows_affected()
        } else {
            sqlx::query("DELETE FROM pre_registration").execute(&mut *tx).await?;
            sqlx::query("UPDATE facility SET pre_registrations = 0")
                .execute(&mut *tx)
                .await?
                .rows_affected()
        };

        tx.commit().await?;
        Ok(touched)
    }
}
