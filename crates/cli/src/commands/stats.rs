use crate::commands::{build_runtime, load_config, CommandResult};
use platzbot_db::connect;
use platzbot_db::repositories::{
    PreRegistrationEntry, PreRegistrationReports, PreRegistrationSummary,
    SqlPreRegistrationReports,
};

pub fn run(days: u32, limit: u32) -> CommandResult {
    let config = match load_config("stats") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("stats") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let reports = SqlPreRegistrationReports::new(pool.clone());
        let summary = reports
            .summary_since_days(days)
            .await
            .map_err(|error| ("query", error.to_string(), 5u8))?;
        let recent = reports
            .recent(limit)
            .await
            .map_err(|error| ("query", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<_, (&'static str, String, u8)>((summary, recent))
    });

    match result {
        Ok((summary, recent)) => {
            CommandResult::success("stats", render_report(&summary, &recent, days))
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("stats", error_class, message, exit_code)
        }
    }
}

fn render_report(
    summary: &PreRegistrationSummary,
    recent: &[PreRegistrationEntry],
    days: u32,
) -> String {
    let mut lines =
        vec![format!("{} pre-registrations in the last {days} days", summary.total)];

    if !summary.by_city.is_empty() {
        lines.push("by city:".to_string());
        for entry in &summary.by_city {
            lines.push(format!(
                "  {}: {}",
                entry.city.as_deref().unwrap_or("unknown"),
                entry.count
            ));
        }
    }
    if !summary.by_facility.is_empty() {
        lines.push("by facility:".to_string());
        for entry in &summary.by_facility {
            lines.push(format!("  {} {}: {}", entry.kennzahl, entry.name, entry.count));
        }
    }
    if !recent.is_empty() {
        lines.push("most recent:".to_string());
        for entry in recent {
            lines.push(format!(
                "  {} {} -> {} ({})",
                entry.record.created_at.format("%Y-%m-%d %H:%M"),
                entry.record.child_name,
                entry.facility_name,
                entry.city.as_deref().unwrap_or("unknown"),
            ));
        }
    }

    lines.join("\n")
}
