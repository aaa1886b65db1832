//! One driver per subcommand.
//!
//! Drivers do the file and database I/O around the pure services and return
//! a report; `main` prints the report and maps errors to the exit code.

use crate::config::{AppConfig, Command, MigrateCommand};
use anyhow::Result;
use std::fmt;

pub mod embed;
pub mod migrate;
pub mod overlap;
pub mod rebuild;
pub mod sync_dates;

const RULE_WIDTH: usize = 60;

/// Run `command` and return its printable summary.
pub async fn dispatch(cfg: &AppConfig, command: Command) -> Result<Box<dyn fmt::Display>> {
    let report: Box<dyn fmt::Display> = match command {
        Command::Overlap => Box::new(overlap::run(cfg).await?),
        Command::Rebuild => Box::new(rebuild::run(cfg).await?),
        Command::SyncDates => Box::new(sync_dates::run(cfg).await?),
        Command::Embed => Box::new(embed::run(cfg).await?),
        Command::Migrate { action } => match action {
            MigrateCommand::Status => Box::new(migrate::status(cfg).await?),
            MigrateCommand::ExportUrls { output } => {
                Box::new(migrate::export_urls(cfg, output).await?)
            }
            MigrateCommand::Scan { dir } => Box::new(migrate::scan(cfg, dir).await?),
            MigrateCommand::Upload { dir } => Box::new(migrate::upload(cfg, dir).await?),
        },
    };
    Ok(report)
}

/// `title` between two horizontal rules.
pub(crate) fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(f, "{rule}")?;
    writeln!(f, "{title}")?;
    writeln!(f, "{rule}")
}

pub(crate) fn rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(RULE_WIDTH))
}
