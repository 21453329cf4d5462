use crate::commands::{build_runtime, load_config, CommandResult};
use platzbot_core::domain::facility::FacilityId;
use platzbot_db::connect;
use platzbot_db::repositories::{FacilityStore, SqlFacilityRepository};

pub fn run(kennzahl: i64) -> CommandResult {
    let config = match load_config("free") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("free") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let repository = SqlFacilityRepository::new(pool.clone());
        let id = FacilityId(kennzahl);
        let facility = repository
            .facility_by_id(id)
            .await
            .map_err(|error| ("query", error.to_string(), 5u8))?;
        let free = repository
            .free_places(id)
            .await
            .map_err(|error| ("query", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>((facility, free))
    });

    match result {
        Ok((Some(facility), Some(free))) => CommandResult::success(
            "free",
            format!("{} {}: {} free places", facility.kennzahl, facility.name, free),
        ),
        Ok(_) => CommandResult::failure(
            "free",
            "not_found",
            format!("no facility with kennzahl {kennzahl}"),
            6,
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("free", error_class, message, exit_code)
        }
    }
}
