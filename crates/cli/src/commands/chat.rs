use std::io::{self, BufRead, Write};

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::commands::{build_runtime, load_config, CommandResult};
use platzbot_agent::llm::ChatMessage;
use platzbot_agent::openai::OpenAiClient;
use platzbot_agent::runtime::Agent;
use platzbot_core::config::{AppConfig, LogFormat};
use platzbot_db::connect;
use platzbot_db::repositories::SqlFacilityRepository;

/// Persona of the assistant. German by default, answers in the user's
/// language, and never presents a stored pre-registration as a binding
/// commitment.
const CHAT_PERSONA: &str = "Du bist ein sachlicher, hilfsbereiter Assistent für Fragen zur Kinderbetreuung \
     in Oberösterreich (der schlaue Fuchs LEO). \
     Standardmäßig antwortest du auf Deutsch, klar und verständlich. \
     Wenn Nutzer*innen jedoch eindeutig in einer anderen Sprache schreiben, \
     antwortest du in derselben Sprache (z.B. Englisch), ohne den Inhalt zu wechseln.\n\n\
     Dir stehen mehrere Datenquellen zur Verfügung: eine strukturierte Datenbank mit \
     Kinderbetreuungseinrichtungen und Platzkapazitäten, ein Dokumentenbestand (RAG) und \
     eine Websuche. Du kannst Einrichtungen und freie Plätze beschreiben und konkrete \
     nächste Schritte vorschlagen.\n\n\
     WICHTIG: Du führst selbst keine verbindlichen Anmeldungen durch. Wenn Nutzer*innen \
     ihr Kind vormerken möchten, kann eine unverbindliche Vormerkung in der Datenbank \
     gespeichert werden. Weise immer darauf hin, dass dies keine verbindliche \
     Platzzusage ist und die endgültige Anmeldung bei der Einrichtung bzw. Gemeinde \
     erfolgt.";

pub fn run() -> CommandResult {
    let config = match load_config("chat") {
        Ok(config) => config,
        Err(result) => return result,
    };
    init_logging(&config);

    let runtime = match build_runtime("chat") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let client = OpenAiClient::from_config(&config.openai)
            .map_err(|error| ("openai_config", error.to_string(), 2u8))?;
        let agent = Agent::new(client.clone(), SqlFacilityRepository::new(pool.clone()), client);

        let turns = chat_loop(&agent).await;
        pool.close().await;
        Ok::<usize, (&'static str, String, u8)>(turns)
    });

    match result {
        Ok(turns) => CommandResult::success("chat", format!("session ended after {turns} turns")),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("chat", error_class, message, exit_code)
        }
    }
}

async fn chat_loop(
    agent: &Agent<OpenAiClient, SqlFacilityRepository, OpenAiClient>,
) -> usize {
    let mut history = vec![ChatMessage::system(CHAT_PERSONA)];
    let mut turns = 0usize;
    let stdin = io::stdin();

    println!("Frage zur Kinderbetreuung eingeben (leer oder `exit` beendet die Sitzung).");
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(read_error) => {
                error!(error = %read_error, "failed to read from stdin");
                break;
            }
        }

        let input = line.trim();
        if input.is_empty() || input.eq_ignore_ascii_case("exit") {
            break;
        }

        history.push(ChatMessage::user(input));
        match agent.handle_turn(&history).await {
            Ok(answer) => {
                println!("{answer}\n");
                history.push(ChatMessage::assistant(answer));
                turns += 1;
            }
            Err(turn_error) => {
                error!(error = %turn_error, "turn failed");
                println!("{}\n", turn_error.user_message());
                // The failed user message stays out of the history so a
                // retry starts from the previous consistent state.
                history.pop();
            }
        }
    }

    turns
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);
    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
