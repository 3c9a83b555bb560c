//! kforge-build - interactive kernel build orchestrator.

use clap::Parser;
use std::process::ExitCode;

use kforge::build;
use kforge::config::Config;
use kforge::logger::Logger;

#[derive(Parser)]
#[command(name = "kforge-build")]
#[command(version)]
#[command(about = "Interactive Linux kernel build assistant")]
#[command(
    after_help = "Fully interactive: prompts for the kernel source tree, build output\n\
                  directory, job count and LOCALVERSION suffix, then runs the standard\n\
                  build and install sequence.\n\n\
                  ENVIRONMENT:\n  \
                  KFORGE_LOG           session log path (default: ./kforge-build-<stamp>.log)\n  \
                  KFORGE_LOCALVERSION  default LOCALVERSION suffix offered at the prompt"
)]
struct Cli {}

fn main() -> ExitCode {
    let _cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load();

    let log_path = match config.session_log_path("kforge-build") {
        Ok(path) => path,
        Err(e) => {
            eprintln!("kforge-build: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let logger = match Logger::create(&log_path) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("kforge-build: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    logger.info(&format!("Session log: {}", log_path.display()));
    match build::run(&logger, &config) {
        Ok(()) => {
            logger.info("Kernel build flow completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            logger.error(&format!("FATAL: {e:#}"));
            ExitCode::FAILURE
        }
    }
}
