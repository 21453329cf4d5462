use crate::commands::{build_runtime, load_config, CommandResult};
use platzbot_db::connect;
use platzbot_db::repositories::{FacilityStore, SqlFacilityRepository};

pub fn run(city: Option<&str>) -> CommandResult {
    let config = match load_config("reset") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("reset") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let repository = SqlFacilityRepository::new(pool.clone());
        let touched = repository
            .reset_pre_registrations(city)
            .await
            .map_err(|error| ("query", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<u64, (&'static str, String, u8)>(touched)
    });

    match result {
        Ok(touched) => {
            let scope = match city {
                Some(city) => format!("in `{city}`"),
                None => "across all cities".to_string(),
            };
            CommandResult::success(
                "reset",
                format!("cleared pre-registrations of {touched} facilities {scope}"),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("reset", error_class, message, exit_code)
        }
    }
}
