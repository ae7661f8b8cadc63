//! `employee-db` entry point.
//!
//! # Responsibility
//! - Parse arguments and start file logging.
//! - Load settings, verify storage, and run the interactive session.
//! - Map startup failures to a non-zero exit code after user remediation.

use clap::Parser;
use employee_core::config::DEFAULT_SETTINGS_FILE;
use employee_core::console::startup::{
    offer_connection_string_update, offer_settings_rewrite, report_storage_failure, verify_store,
};
use employee_core::console::ConsoleResult;
use employee_core::{
    core_version, default_log_level, init_logging, Console, EmployeeService, Session,
    SettingsFile, SettingsOrigin, SqliteEmployeeRepository,
};
use log::{error, info, warn};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "employee-db", version, about = "Manage employee records from the console")]
struct Cli {
    /// Settings file holding `Database.ConnectionString`.
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// trace|debug|info|warn|error (defaults to debug in debug builds, info otherwise).
    #[arg(long)]
    log_level: Option<String>,

    /// Directory for rolling log files (defaults to ./logs).
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = start_logging(&cli) {
        eprintln!("warning: file logging disabled: {err}");
    }
    info!("event=cli_start module=cli status=ok version={}", core_version());

    let stdin = io::stdin();
    let console = Console::new(stdin.lock(), io::stdout());
    match run(&cli, console) {
        Ok(code) => code,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn start_logging(cli: &Cli) -> Result<(), String> {
    let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
    let log_dir = match &cli.log_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => current_dir()?.join(dir),
        None => current_dir()?.join("logs"),
    };
    init_logging(level, &log_dir)
}

fn current_dir() -> Result<PathBuf, String> {
    std::env::current_dir().map_err(|err| format!("cannot resolve working directory: {err}"))
}

fn run<I: BufRead, O: Write>(cli: &Cli, mut console: Console<I, O>) -> ConsoleResult<ExitCode> {
    let mut settings = match SettingsFile::load_or_create(&cli.settings) {
        Ok((settings, SettingsOrigin::Loaded)) => settings,
        Ok((settings, SettingsOrigin::CreatedDefault)) => {
            console.say(format!(
                "Default connection settings were written to {}.",
                settings.path().display()
            ))?;
            console.say("Check the connection string there before relying on it.")?;
            settings
        }
        Err(err) => {
            error!("event=settings_load module=cli status=error error={err}");
            console.say(format!("Settings error: {err}"))?;
            offer_settings_rewrite(&mut console, &cli.settings)?;
            console.pause("Press Enter to exit...")?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let repo = match SqliteEmployeeRepository::from_connection_string(settings.connection_string()) {
        Ok(repo) => repo,
        Err(err) => return startup_failed(&mut console, &mut settings, err),
    };
    let mut service = EmployeeService::new(repo);
    if let Err(err) = verify_store(&mut service, &mut console)? {
        return startup_failed(&mut console, &mut settings, err);
    }

    let mut session = Session::new(service, settings, console);
    let outcome = session.run();
    if let Err(err) = session.close() {
        warn!("event=cli_exit module=cli status=error error_code=store_close_failed error={err}");
    }

    match outcome {
        Ok(()) => {
            info!("event=cli_exit module=cli status=ok");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn startup_failed<I: BufRead, O: Write>(
    console: &mut Console<I, O>,
    settings: &mut SettingsFile,
    err: employee_core::RepoError,
) -> ConsoleResult<ExitCode> {
    report_storage_failure(console, settings, &err)?;
    offer_connection_string_update(console, settings)?;
    console.pause("Press Enter to exit...")?;
    Ok(ExitCode::FAILURE)
}
