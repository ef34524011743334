//! Multi-file merge.
//!
//! A model run is usually split across many bpch files covering consecutive
//! time windows. Merging aligns their per-file indexes into one view ordered
//! along the time axis. The merge refuses anything ambiguous: differing
//! grids, differing variable sets, or time ranges that overlap across files.
//! Silently keeping "the first" of two overlapping records could hide a
//! duplicated or mis-ordered input file, so it is never done.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use bpch_common::{BpchError, BpchResult, GridSpec};

use crate::index::{FileIndex, VariableDescriptor};

/// Union of several files' indexes over one shared grid.
#[derive(Debug, Clone)]
pub struct MergedIndex {
    pub grid: GridSpec,
    /// Per variable, all records across all files, sorted by `time_start`.
    pub variables: BTreeMap<String, Vec<VariableDescriptor>>,
    /// Contributing files in the order supplied by the caller.
    pub files: Vec<PathBuf>,
}

impl MergedIndex {
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&[VariableDescriptor]> {
        self.variables.get(name).map(Vec::as_slice)
    }
}

/// Merge per-file indexes into one time-ordered index.
///
/// Deterministic for a given input order; the caller controls file order and
/// the result does not depend on filesystem enumeration.
pub fn merge(indexes: &[FileIndex]) -> BpchResult<MergedIndex> {
    let Some(first) = indexes.first() else {
        return Err(BpchError::SchemaMismatch {
            path: PathBuf::new(),
            detail: "no file indexes supplied to merge".to_string(),
        });
    };

    for index in &indexes[1..] {
        if index.grid != first.grid {
            return Err(BpchError::GridMismatch {
                path: index.path.clone(),
            });
        }
        check_same_variables(first, index)?;
    }

    let mut variables: BTreeMap<String, Vec<VariableDescriptor>> = BTreeMap::new();
    for index in indexes {
        for (name, descriptors) in &index.variables {
            variables
                .entry(name.clone())
                .or_default()
                .extend(descriptors.iter().cloned());
        }
    }

    for (name, descriptors) in variables.iter_mut() {
        descriptors.sort_by(|a, b| a.time_start.cmp(&b.time_start));
        for pair in descriptors.windows(2) {
            if pair[1].time_start < pair[0].time_end {
                return Err(BpchError::OverlappingTimeRange {
                    name: name.clone(),
                    path_a: pair[0].path.clone(),
                    path_b: pair[1].path.clone(),
                });
            }
        }
    }

    debug!(
        files = indexes.len(),
        variables = variables.len(),
        "merged file indexes"
    );

    Ok(MergedIndex {
        grid: first.grid.clone(),
        variables,
        files: indexes.iter().map(|i| i.path.clone()).collect(),
    })
}

fn check_same_variables(first: &FileIndex, other: &FileIndex) -> BpchResult<()> {
    let missing: Vec<&str> = first
        .variables
        .keys()
        .filter(|k| !other.variables.contains_key(*k))
        .map(String::as_str)
        .collect();
    let extra: Vec<&str> = other
        .variables
        .keys()
        .filter(|k| !first.variables.contains_key(*k))
        .map(String::as_str)
        .collect();

    if missing.is_empty() && extra.is_empty() {
        return Ok(());
    }

    let mut detail = String::new();
    if !missing.is_empty() {
        detail.push_str(&format!("missing [{}]", missing.join(", ")));
    }
    if !extra.is_empty() {
        if !detail.is_empty() {
            detail.push_str("; ");
        }
        detail.push_str(&format!("unexpected [{}]", extra.join(", ")));
    }

    Err(BpchError::SchemaMismatch {
        path: other.path.clone(),
        detail,
    })
}
