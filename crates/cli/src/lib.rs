pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "platzbot",
    about = "Platzbot operator CLI",
    long_about = "Operate the childcare-availability database: migrations, demo fixtures, \
                  capacity queries, pre-registrations, and an interactive chat session.",
    after_help = "Examples:\n  platzbot migrate\n  platzbot search Linz\n  platzbot free 401001\n  platzbot chat"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo facility dataset")]
    Seed,
    #[command(about = "Search facilities by city name or postal code")]
    Search {
        #[arg(help = "City name (exact or substring) or a numeric postal code")]
        query: String,
    },
    #[command(about = "Show the free places of one facility")]
    Free {
        #[arg(help = "Facility identifier (Kennzahl)")]
        kennzahl: i64,
    },
    #[command(about = "Store one non-binding pre-registration for a facility")]
    Reserve {
        #[arg(help = "Facility identifier (Kennzahl)")]
        kennzahl: i64,
        #[arg(long, help = "Parent name")]
        parent: String,
        #[arg(long, help = "Parent contact e-mail")]
        email: String,
        #[arg(long, help = "Child name")]
        child: String,
    },
    #[command(about = "Zero pre-registration counters, globally or for one city")]
    Reset {
        #[arg(long, help = "Only reset facilities of this city (case-insensitive)")]
        city: Option<String>,
    },
    #[command(about = "Report recent pre-registrations and per-city totals")]
    Stats {
        #[arg(long, default_value_t = 30, help = "Summary window in days")]
        days: u32,
        #[arg(long, default_value_t = 10, help = "Number of recent entries to list")]
        limit: u32,
    },
    #[command(about = "Start an interactive chat session against the configured models")]
    Chat,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Search { query } => commands::search::run(&query),
        Command::Free { kennzahl } => commands::free::run(kennzahl),
        Command::Reserve { kennzahl, parent, email, child } => {
            commands::reserve::run(kennzahl, &parent, &email, &child)
        }
        Command::Reset { city } => commands::reset::run(city.as_deref()),
        Command::Stats { days, limit } => commands::stats::run(days, limit),
        Command::Chat => commands::chat::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
