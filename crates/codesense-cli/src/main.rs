// codesense CLI entry point

use std::process::ExitCode;

use clap::Parser;
use codesense_cli::Cli;
use codesense_sensors::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("error: {}", e);
        return ExitCode::from(2);
    }

    match cli.run().await {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
