use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use spendwise::cli::{
    handle_account_command, handle_category_command, handle_export_command, handle_limit_command,
    handle_record_command, handle_report_command,
};
use spendwise::config::{paths::SpendwisePaths, settings::Settings};
use spendwise::storage::{initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "spendwise",
    version,
    about = "Expense ledger with consistent balances and spending-limit forecasts",
    long_about = "Spendwise keeps money accounts and their expense records consistent: \
                  every record moves its account's balance, statistics are computed per \
                  category, and spending limits forecast where the current pace will land."
)]
struct Cli {
    /// Log level for diagnostics on stderr (RUST_LOG overrides it)
    #[arg(long, global = true, env = "SPENDWISE_LOG", default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and default categories
    Init,

    /// Show current configuration and paths
    Config,

    /// Money account commands
    #[command(subcommand)]
    Account(spendwise::cli::AccountCommands),

    /// Expense record commands
    #[command(subcommand, alias = "rec")]
    Record(spendwise::cli::RecordCommands),

    /// Spending limit commands
    #[command(subcommand)]
    Limit(spendwise::cli::LimitCommands),

    /// Statistics and history
    #[command(subcommand)]
    Report(spendwise::cli::ReportCommands),

    /// Categories, account types and repeat policies
    #[command(subcommand)]
    Category(spendwise::cli::CategoryCommands),

    /// CSV exports
    #[command(subcommand)]
    Export(spendwise::cli::ExportCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.log_level);
    debug!("Log level set to {}", cli.log_level.to_string().to_lowercase());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    // Initialize paths and settings
    let paths = SpendwisePaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    let Some(command) = cli.command else {
        println!("Spendwise - expense ledger and spending-limit forecasts");
        println!();
        println!("Run 'spendwise --help' for usage information.");
        println!("Run 'spendwise init' to get started.");
        return Ok(());
    };

    match command {
        Commands::Init => {
            println!("Initializing Spendwise at: {}", paths.base_dir().display());
            let seeded = initialize_storage(&storage)?;
            settings.setup_completed = true;
            settings.save(&paths)?;
            println!("Initialization complete!");
            if seeded {
                println!();
                println!("Default categories, account types and repeat policies have been created.");
                println!("Run 'spendwise category list' to see all categories.");
            }
            return Ok(());
        }
        Commands::Config => {
            println!("Spendwise Configuration");
            println!("=======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  User:            {}", settings.user_id);
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Date format:     {}", settings.date_format);
            println!("  Initialized:     {}", paths.is_initialized());
            return Ok(());
        }
        _ => {}
    }

    if !paths.is_initialized() {
        bail!("Spendwise is not initialized. Run 'spendwise init' first.");
    }

    match command {
        Commands::Account(cmd) => handle_account_command(&storage, &settings, cmd)?,
        Commands::Record(cmd) => handle_record_command(&storage, &settings, cmd)?,
        Commands::Limit(cmd) => handle_limit_command(&storage, &settings, cmd)?,
        Commands::Report(cmd) => handle_report_command(&storage, &settings, cmd)?,
        Commands::Category(cmd) => handle_category_command(&storage, cmd)?,
        Commands::Export(cmd) => handle_export_command(&storage, &settings, cmd)?,
        Commands::Init | Commands::Config => {}
    }

    Ok(())
}

/// Route diagnostics to stderr, honoring RUST_LOG when it is set
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        // Without RUST_LOG, only this crate's events at the requested level
        None => EnvFilter::new(format!(
            "{}={},{}={}",
            env!("CARGO_CRATE_NAME"),
            level,
            env!("CARGO_BIN_NAME"),
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
