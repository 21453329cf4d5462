use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use uuid::Uuid;

use platzbot_core::domain::facility::FacilityId;
use platzbot_core::domain::pre_registration::PreRegistration;

use super::{
    CityCount, FacilityCount, PreRegistrationEntry, PreRegistrationReports,
    PreRegistrationSummary, RepositoryError,
};
use crate::DbPool;

pub struct SqlPreRegistrationReports {
    pool: DbPool,
}

impl SqlPreRegistrationReports {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<PreRegistrationEntry, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let kennzahl: i64 =
        row.try_get("kennzahl").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let parent_name: String =
        row.try_get("parent_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let parent_email: String =
        row.try_get("parent_email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let child_name: String =
        row.try_get("child_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let facility_name: String =
        row.try_get("facility_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let city: Option<String> =
        row.try_get("city").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let id = Uuid::parse_str(&id).map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(PreRegistrationEntry {
        record: PreRegistration {
            id,
            kennzahl: FacilityId(kennzahl),
            parent_name,
            parent_email,
            child_name,
            created_at,
        },
        facility_name,
        city,
    })
}

#[async_trait::async_trait]
impl PreRegistrationReports for SqlPreRegistrationReports {
    async fn recent(&self, limit: u32) -> Result<Vec<PreRegistrationEntry>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT p.id, p.kennzahl, p.parent_name, p.parent_email, p.child_name, \
                    p.created_at, f.name AS facility_name, f.city \
             FROM pre_registration p \
             JOIN facility f ON f.kennzahl = p.kennzahl \
             ORDER BY p.created_at DESC \
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn summary_since_days(
        &self,
        days: u32,
    ) -> Result<PreRegistrationSummary, RepositoryError> {
        let since = Utc::now() - Duration::days(i64::from(days));
        let since_str = since.to_rfc3339();

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM pre_registration WHERE datetime(created_at) >= datetime(?)",
        )
        .bind(&since_str)
        .fetch_one(&self.pool)
        .await?;

        let facility_rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT f.kennzahl, f.name, f.city, COUNT(p.id) AS pre_reg_count \
             FROM pre_registration p \
             JOIN facility f ON f.kennzahl = p.kennzahl \
             WHERE datetime(p.created_at) >= datetime(?) \
             GROUP BY f.kennzahl, f.name, f.city \
             ORDER BY pre_reg_count DESC, f.city, f.name",
        )
        .bind(&since_str)
        .fetch_all(&self.pool)
        .await?;

        let by_facility = facility_rows
            .iter()
            .map(|row| {
                Ok(FacilityCount {
                    kennzahl: FacilityId(
                        row.try_get("kennzahl")
                            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    ),
                    name: row
                        .try_get("name")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    city: row
                        .try_get("city")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    count: row
                        .try_get("pre_reg_count")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        let city_rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT f.city, COUNT(p.id) AS pre_reg_count \
             FROM pre_registration p \
             JOIN facility f ON f.kennzahl = p.kennzahl \
             WHERE datetime(p.created_at) >= datetime(?) \
             GROUP BY f.city \
             ORDER BY pre_reg_count DESC, f.city",
        )
        .bind(&since_str)
        .fetch_all(&self.pool)
        .await?;

        let by_city = city_rows
            .iter()
            .map(|row| {
                Ok(CityCount {
                    city: row
                        .try_get("city")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    count: row
                        .try_get("pre_reg_count")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(PreRegistrationSummary { since, total, by_facility, by_city })
    }
}
