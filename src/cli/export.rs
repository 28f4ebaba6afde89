//! Export CLI commands
//!
//! Writes CSV exports to a file or to stdout.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::error::SpendwiseResult;
use crate::export::{export_accounts_csv, export_records_csv};
use crate::storage::Storage;

/// Export subcommands
#[derive(Subcommand)]
pub enum ExportCommands {
    /// Export expense records as CSV
    Records {
        /// Output file ("-" for stdout)
        #[arg(default_value = "-")]
        output: PathBuf,
    },
    /// Export money accounts as CSV
    Accounts {
        /// Output file ("-" for stdout)
        #[arg(default_value = "-")]
        output: PathBuf,
    },
}

fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Handle an export command
pub fn handle_export_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExportCommands,
) -> SpendwiseResult<()> {
    let user_id = settings.user_id;

    match cmd {
        ExportCommands::Records { output } => {
            if is_stdout(&output) {
                export_records_csv(storage, user_id, io::stdout().lock())?;
            } else {
                let file = BufWriter::new(File::create(&output)?);
                let rows = export_records_csv(storage, user_id, file)?;
                println!("Exported {} records to {}", rows, output.display());
            }
        }

        ExportCommands::Accounts { output } => {
            if is_stdout(&output) {
                export_accounts_csv(storage, user_id, io::stdout().lock())?;
            } else {
                let file = BufWriter::new(File::create(&output)?);
                let rows = export_accounts_csv(storage, user_id, file)?;
                println!("Exported {} accounts to {}", rows, output.display());
            }
        }
    }

    Ok(())
}
