//! Deterministic demo dataset for local runs and end-to-end tests: a handful
//! of Upper-Austrian facilities covering the interesting ledger states
//! (free capacity, exhausted capacity, no capacity data).

use crate::repositories::RepositoryError;
use crate::DbPool;

struct SeedFacility {
    kennzahl: i64,
    name: &'static str,
    city: &'static str,
    postal_code: &'static str,
    phone: Option<&'static str>,
    email: Option<&'static str>,
    website: Option<&'static str>,
    capacity_estimate: Option<i64>,
    current_occupancy: Option<i64>,
}

const DEMO_FACILITIES: &[SeedFacility] = &[
    SeedFacility {
        kennzahl: 401001,
        name: "Kindergarten Linz Zentrum",
        city: "Linz",
        postal_code: "4020",
        phone: Some("+43 732 7070 1111"),
        email: Some("kg.zentrum@linz.at"),
        website: Some("https://www.linz.at/kindergarten-zentrum"),
        capacity_estimate: Some(50),
        current_occupancy: Some(42),
    },
    SeedFacility {
        kennzahl: 401002,
        name: "Krabbelstube Urfahr",
        city: "Linz",
        postal_code: "4040",
        phone: Some("+43 732 7070 2222"),
        email: Some("krabbelstube.urfahr@linz.at"),
        website: None,
        capacity_estimate: Some(24),
        current_occupancy: Some(24),
    },
    SeedFacility {
        kennzahl: 403005,
        name: "Kindergarten Wels Stadtplatz",
        city: "Wels",
        postal_code: "4600",
        phone: Some("+43 7242 235 3333"),
        email: Some("kg.stadtplatz@wels.gv.at"),
        website: Some("https://www.wels.gv.at/kindergarten-stadtplatz"),
        capacity_estimate: Some(40),
        current_occupancy: Some(31),
    },
    SeedFacility {
        kennzahl: 402003,
        name: "Kindergarten Steyr Ennsleite",
        city: "Steyr",
        postal_code: "4400",
        phone: None,
        email: Some("kg.ennsleite@steyr.at"),
        website: None,
        capacity_estimate: None,
        current_occupancy: None,
    },
    SeedFacility {
        kennzahl: 410007,
        name: "Kindergarten Hagenberg",
        city: "Hagenberg im Mühlkreis",
        postal_code: "4232",
        phone: Some("+43 7236 2255 44"),
        email: Some("kindergarten@hagenberg.at"),
        website: Some("https://www.hagenberg.at/kindergarten"),
        capacity_estimate: Some(30),
        current_occupancy: Some(26),
    },
    SeedFacility {
        kennzahl: 410008,
        name: "Krabbelstube Hagenberg Softwarepark",
        city: "Hagenberg im Mühlkreis",
        postal_code: "4232",
        phone: None,
        email: None,
        website: Some("https://www.hagenberg.at/krabbelstube"),
        capacity_estimate: Some(12),
        current_occupancy: Some(9),
    },
];

#[derive(Clone, Debug)]
pub struct SeedResult {
    pub facilities_loaded: usize,
}

#[derive(Clone, Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub expected: usize,
    pub found: i64,
}

pub struct DemoDataset;

impl DemoDataset {
    /// Upserts the demo facilities. Ledger counters of existing rows are
    /// preserved so re-seeding does not wipe recorded pre-registrations.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        for seed in DEMO_FACILITIES {
            sqlx::query(
                "INSERT INTO facility \
                 (kennzahl, name, city, postal_code, phone, email, website, \
                  capacity_estimate, current_occupancy, pre_registrations) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0) \
                 ON CONFLICT(kennzahl) DO UPDATE SET \
                     name = excluded.name, \
                     city = excluded.city, \
                     postal_code = excluded.postal_code, \
                     phone = excluded.phone, \
                     email = excluded.email, \
                     website = excluded.website, \
                     capacity_estimate = excluded.capacity_estimate, \
                     current_occupancy = excluded.current_occupancy",
            )
            .bind(seed.kennzahl)
            .bind(seed.name)
            .bind(seed.city)
            .bind(seed.postal_code)
            .bind(seed.phone)
            .bind(seed.email)
            .bind(seed.website)
            .bind(seed.capacity_estimate)
            .bind(seed.current_occupancy)
            .execute(pool)
            .await?;
        }

        Ok(SeedResult { facilities_loaded: DEMO_FACILITIES.len() })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let kennzahlen: Vec<String> =
            DEMO_FACILITIES.iter().map(|seed| seed.kennzahl.to_string()).collect();
        let query = format!(
            "SELECT COUNT(*) FROM facility WHERE kennzahl IN ({})",
            kennzahlen.join(", ")
        );
        let (found,): (i64,) = sqlx::query_as(&query).fetch_one(pool).await?;

        Ok(VerificationResult {
            all_present: found as usize == DEMO_FACILITIES.len(),
            expected: DEMO_FACILITIES.len(),
            found,
        })
    }
}
