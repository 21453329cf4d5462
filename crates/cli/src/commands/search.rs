use crate::commands::{build_runtime, load_config, CommandResult};
use platzbot_core::domain::facility::Facility;
use platzbot_db::repositories::{FacilityStore, SqlFacilityRepository};
use platzbot_db::connect;

pub fn run(query: &str) -> CommandResult {
    let config = match load_config("search") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("search") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let repository = SqlFacilityRepository::new(pool.clone());
        let facilities = repository
            .find_facilities(query)
            .await
            .map_err(|error| ("query", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<Vec<Facility>, (&'static str, String, u8)>(facilities)
    });

    match result {
        Ok(facilities) => CommandResult::success("search", render_matches(&facilities, query)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("search", error_class, message, exit_code)
        }
    }
}

fn render_matches(facilities: &[Facility], query: &str) -> String {
    if facilities.is_empty() {
        return format!("no facilities matched `{query}`");
    }

    let mut lines = vec![format!("{} facilities matched `{query}`:", facilities.len())];
    for facility in facilities {
        lines.push(format!(
            "  {} {} ({}, {} free places)",
            facility.kennzahl,
            facility.name,
            facility.city.as_deref().unwrap_or("unknown city"),
            facility.ledger.free_places(),
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use platzbot_core::domain::facility::{CapacityLedger, Facility, FacilityId};

    use super::render_matches;

    #[test]
    fn matches_are_rendered_one_per_line() {
        let facilities = vec![Facility {
            kennzahl: FacilityId(401001),
            name: "Kindergarten Linz Zentrum".to_string(),
            city: Some("Linz".to_string()),
            postal_code: Some("4020".to_string()),
            phone: None,
            email: None,
            website: None,
            ledger: CapacityLedger {
                capacity_estimate: Some(50),
                current_occupancy: Some(42),
                pre_registrations: Some(0),
            },
        }];

        let rendered = render_matches(&facilities, "Linz");
        assert!(rendered.starts_with("1 facilities matched `Linz`:"));
        assert!(rendered.contains("401001 Kindergarten Linz Zentrum (Linz, 8 free places)"));
    }

    #[test]
    fn empty_result_is_stated_plainly() {
        assert_eq!(render_matches(&[], "Gmunden"), "no facilities matched `Gmunden`");
    }
}
