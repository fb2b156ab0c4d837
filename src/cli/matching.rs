use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::aggregator::UnitPolicy;
use crate::cli::preview;
use crate::cli::MatchFlags;
use crate::error::Result;
use crate::fuzzy::ScorerKind;
use crate::loader::{load, Role};
use crate::matcher::MatchOptions;
use crate::models::Table;
use crate::pipeline::{self, PipelineOptions};
use crate::settings::{expand_path, load_settings, parse_threshold, Settings};
use crate::writer::{write_table, OutputFormat};

struct Resolved {
    options: PipelineOptions,
    output: PathBuf,
}

/// CLI flags take precedence over saved settings. The output path is checked
/// here so a bad extension fails before any input is read.
fn resolve_options(flags: &MatchFlags, settings: &Settings) -> Result<Resolved> {
    let threshold = match &flags.threshold {
        Some(t) => parse_threshold(t)?,
        None => settings.threshold,
    };
    let scorer = match &flags.scorer {
        Some(s) => ScorerKind::from_key(s)?,
        None => settings.scorer,
    };
    let unit_policy = match &flags.unit_policy {
        Some(p) => UnitPolicy::from_key(p)?,
        None => settings.unit_policy,
    };
    let output = expand_path(flags.output.as_deref().unwrap_or(&settings.output_file));
    OutputFormat::for_path(&output)?;
    Ok(Resolved {
        options: PipelineOptions {
            matching: MatchOptions { threshold, scorer },
            unit_policy,
        },
        output,
    })
}

fn load_announced(path: &Path, role: Role, sheet: Option<&str>) -> Result<Table> {
    let table = load(path, role, sheet)?;
    println!(
        "{} {role} sheet loaded: {} rows, {} columns",
        "\u{2713}".green().bold(),
        table.len(),
        table.headers.len()
    );
    Ok(table)
}

pub fn run(master: &str, raw: &str, flags: MatchFlags) -> Result<()> {
    let settings = load_settings();
    let Resolved { options, output: out_path } = resolve_options(&flags, &settings)?;

    let master = load_announced(&expand_path(master), Role::Master, flags.master_sheet.as_deref())?;
    let raw = load_announced(&expand_path(raw), Role::Raw, flags.raw_sheet.as_deref())?;

    let output = pipeline::run(&master, &raw, &options)?;
    let merge = &output.merge;

    let preview_rows = flags.preview.unwrap_or(settings.preview_rows);
    if !flags.no_preview && preview_rows > 0 && !merge.table.is_empty() {
        println!();
        println!("Matched data preview\n{}", preview::render(merge, preview_rows));
    }
    println!("{}", preview::summary(&merge.report, output.master_items));

    write_table(&merge.table, &out_path)?;
    println!("Wrote {}", out_path.display());
    Ok(())
}
