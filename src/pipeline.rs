use crate::aggregator::{aggregate_master, UnitPolicy};
use crate::error::Result;
use crate::loader::{validate, Role};
use crate::matcher::{match_and_merge, MatchOptions, MergeOutput};
use crate::models::Table;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineOptions {
    pub matching: MatchOptions,
    pub unit_policy: UnitPolicy,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub master_items: usize,
    pub merge: MergeOutput,
}

/// Validate both tables, aggregate the master and merge it onto the raw rows.
/// A schema error in either table stops before any matching happens.
pub fn run(master: &Table, raw: &Table, options: &PipelineOptions) -> Result<PipelineOutput> {
    validate(master, Role::Master)?;
    validate(raw, Role::Raw)?;
    let items = aggregate_master(master, options.unit_policy)?;
    let merge = match_and_merge(raw, &items, &options.matching)?;
    Ok(PipelineOutput {
        master_items: items.len(),
        merge,
    })
}
