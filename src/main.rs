use budget_ledger::args::{Args, Command};
use budget_ledger::commands::{self, load_config, open_budget};
use budget_ledger::{Result, SystemClock};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with {} error: {e}", e.error_type());
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    // Commands that only touch the configuration.
    match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.backend()).await?.print();
            return Ok(());
        }
        Command::Login(login_args) => {
            commands::login(load_config(home).await?, login_args.user())
                .await?
                .print();
            return Ok(());
        }
        Command::Logout => {
            commands::logout(load_config(home).await?).await?.print();
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(home).await?;
    let mut budget = open_budget(&config, Arc::new(SystemClock)).await?;

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Month(month_args) => commands::month(&mut budget, month_args).await?.print(),
        Command::Add(add_args) => commands::add(&mut budget, add_args).await?.print(),
        Command::Delete(delete_args) => commands::delete(&mut budget, delete_args).await?.print(),
        Command::List(list_args) => commands::list(&mut budget, list_args).await?.print(),
        Command::Summary => commands::summary(&budget).await?.print(),
        Command::People => commands::people(&budget).await?.print(),
        Command::Carry => commands::carry(&mut budget).await?.print(),
        Command::Export(export_args) => commands::export(&budget, export_args).await?.print(),
        Command::Init(_) | Command::Login(_) | Command::Logout => {}
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
