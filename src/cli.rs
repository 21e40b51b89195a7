use std::path::PathBuf;

use clap::{ArgAction, Parser};

use maptasker::fields::ReimportPolicy;

use crate::cmd::Commands;

/// Floorplan-to-checklist tracker for field installs.
/// Data lives in --dir, $MAPTASKER_HOME or ~/.maptasker.
#[derive(Parser)]
#[command(name = "mt", version, about = "Turn floorplan PDFs into field task checklists")]
pub struct Cli {
    /// Data directory holding projects, settings.json and templates.json.
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Project to work on (defaults to the most recently modified).
    #[arg(long, short, global = true)]
    pub project: Option<String>,

    /// More logging: -v for info, -vv for debug. RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override the configured re-import policy for this run.
    #[arg(long, value_enum, global = true)]
    pub policy: Option<ReimportPolicy>,

    /// Do not merge letters separated by the PDF's character spacing.
    #[arg(long, global = true)]
    pub no_kerning: bool,

    /// Skip the backup normally taken before an import.
    #[arg(long, global = true)]
    pub no_backup: bool,

    #[command(subcommand)]
    pub command: Commands,
}
