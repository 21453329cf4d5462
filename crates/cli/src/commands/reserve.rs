use crate::commands::{build_runtime, load_config, CommandResult};
use platzbot_core::domain::facility::FacilityId;
use platzbot_db::connect;
use platzbot_db::repositories::{FacilityStore, SqlFacilityRepository};

pub fn run(kennzahl: i64, parent: &str, email: &str, child: &str) -> CommandResult {
    let config = match load_config("reserve") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("reserve") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let repository = SqlFacilityRepository::new(pool.clone());
        let stored = repository
            .reserve(FacilityId(kennzahl), parent, email, child)
            .await
            .map_err(|error| ("query", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<bool, (&'static str, String, u8)>(stored)
    });

    match result {
        Ok(true) => CommandResult::success(
            "reserve",
            format!("stored pre-registration for `{child}` at facility {kennzahl}"),
        ),
        Ok(false) => CommandResult::failure(
            "reserve",
            "rejected",
            format!("facility {kennzahl} is unknown or has no free places left"),
            6,
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("reserve", error_class, message, exit_code)
        }
    }
}
