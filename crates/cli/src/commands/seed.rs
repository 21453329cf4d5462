use crate::commands::{build_runtime, load_config, CommandResult};
use platzbot_db::{connect, migrations, DemoDataset};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = DemoDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;
        let verification = DemoDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result = if verification.all_present {
            Ok(seed_result.facilities_loaded)
        } else {
            Err((
                "seed_verification",
                format!(
                    "expected {} demo facilities, found {}",
                    verification.expected, verification.found
                ),
                6u8,
            ))
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(loaded) => {
            CommandResult::success("seed", format!("loaded {loaded} demo facilities"))
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
