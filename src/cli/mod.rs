pub mod check;
pub mod config;
pub mod matching;
pub mod preview;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pricematch",
    version,
    about = "Fill unit and unit price into an inventory sheet by fuzzy-matching item codes against a master price list."
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). PRICEMATCH_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Match raw item codes against the master list and write the merged sheet.
    Match {
        /// Master price list (.xlsx/.xls/.ods/.csv) with S No., Item Code, Unit, Unit Price
        master: String,
        /// Raw inventory sheet with an Item Code column
        raw: String,
        #[command(flatten)]
        flags: MatchFlags,
    },
    /// Validate one sheet without running the match.
    Check {
        /// Path to the sheet
        file: String,
        /// Which columns to require: master or raw
        #[arg(long)]
        role: String,
        /// Worksheet name (default: first sheet)
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Show or change saved defaults.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Default)]
pub struct MatchFlags {
    /// Output path, .xlsx or .csv (default: updated_with_prices_and_units.xlsx)
    #[arg(short, long)]
    pub output: Option<String>,
    /// Minimum similarity score, 0-100
    #[arg(long)]
    pub threshold: Option<String>,
    /// Scorer: token-sort, ratio, levenshtein, jaro-winkler
    #[arg(long)]
    pub scorer: Option<String>,
    /// Unit for duplicated codes: first (file order) or cheapest (row with the lowest price)
    #[arg(long = "unit-policy")]
    pub unit_policy: Option<String>,
    /// Number of merged rows to preview
    #[arg(long)]
    pub preview: Option<usize>,
    /// Skip the preview table
    #[arg(long = "no-preview")]
    pub no_preview: bool,
    /// Worksheet name in the master workbook
    #[arg(long = "master-sheet")]
    pub master_sheet: Option<String>,
    /// Worksheet name in the raw workbook
    #[arg(long = "raw-sheet")]
    pub raw_sheet: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings and where they are stored.
    Show,
    /// Save one setting (threshold, scorer, unit_policy, preview_rows, output_file).
    Set {
        key: String,
        value: String,
    },
}
