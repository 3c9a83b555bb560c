//! kforge-remove - installed kernel removal.

use clap::Parser;
use std::process::ExitCode;

use kforge::config::Config;
use kforge::logger::Logger;
use kforge::remove;

#[derive(Parser)]
#[command(name = "kforge-remove")]
#[command(version)]
#[command(about = "Remove an installed kernel's artifacts")]
#[command(
    after_help = "Fully interactive: prompts for a kernel image name\n\
                  (vmlinuz-<release>) or a build directory, confirms, then deletes the\n\
                  installed artifacts for that release.\n\n\
                  ENVIRONMENT:\n  \
                  KFORGE_LOG  session log path (default: ./kforge-remove-<stamp>.log)"
)]
struct Cli {}

fn main() -> ExitCode {
    let _cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load();

    let log_path = match config.session_log_path("kforge-remove") {
        Ok(path) => path,
        Err(e) => {
            eprintln!("kforge-remove: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let logger = match Logger::create(&log_path) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("kforge-remove: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    logger.info(&format!("Session log: {}", log_path.display()));
    match remove::run(&logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger.error(&format!("FATAL: {e:#}"));
            ExitCode::FAILURE
        }
    }
}
