use std::process::ExitCode;

fn main() -> ExitCode {
    platzbot_cli::run()
}
