//! Variable index builder.
//!
//! Joins raw scan output with the metadata catalog and the grid registry to
//! produce resolved, immutable [`VariableDescriptor`]s grouped by variable
//! name. Nothing is defaulted: a block whose tracer code cannot be resolved
//! either aborts the build or is dropped with a warning, depending on the
//! configured policy.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bpch_catalog::Catalog;
use bpch_common::{
    grid::resolve_grid, tau_to_datetime, BlockShape, BpchError, BpchResult, DataKind, Endian,
    GridSpec,
};

use crate::scanner::{FileHeader, Scanner, VariableBlock};

/// What to do with a block whose tracer code is absent from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPolicy {
    /// Abort the whole index build on the first unresolvable block.
    #[default]
    Strict,
    /// Drop unresolvable blocks, keep the rest, log each drop.
    Lenient,
}

/// Index-build configuration.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub policy: ResolutionPolicy,
    /// Keep only these variable names (post-resolution filter).
    pub name_filter: Option<HashSet<String>>,
    /// Keep only these categories, skipping catalog lookups for the rest.
    pub category_filter: Option<HashSet<String>>,
}

/// One resolved, immutable record: everything needed to locate, decode and
/// label a single time-record of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    /// `<category>_<tracer name>`.
    pub name: String,
    pub category: String,
    pub unit: String,
    pub scale_factor: f64,
    pub shape: BlockShape,
    /// 1-indexed origin of the block inside the model grid.
    pub origin: (usize, usize, usize),
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    pub tau0: f64,
    pub tau1: f64,
    pub path: PathBuf,
    /// File position of the first payload byte.
    pub byte_offset: u64,
    pub byte_size: u64,
    pub kind: DataKind,
    pub endian: Endian,
}

/// All variables of one file, each as a time-ordered descriptor sequence.
#[derive(Debug, Clone)]
pub struct FileIndex {
    pub path: PathBuf,
    pub header: FileHeader,
    pub grid: GridSpec,
    pub variables: BTreeMap<String, Vec<VariableDescriptor>>,
}

impl FileIndex {
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&[VariableDescriptor]> {
        self.variables.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Scan a whole file into a [`FileIndex`].
///
/// Consumes the scanner; a scan error mid-file aborts the build, since a
/// partial walk cannot vouch for any offset after the failure point.
pub fn build_index(
    scanner: Scanner,
    catalog: &Catalog,
    options: &IndexOptions,
) -> BpchResult<FileIndex> {
    let header = scanner.header().clone();
    let path = scanner.path().to_path_buf();

    let grid = resolve_grid(
        &header.model_name,
        header.resolution,
        header.halfpolar,
        header.center180,
    )?;

    let mut variables: BTreeMap<String, Vec<VariableDescriptor>> = BTreeMap::new();
    let mut total = 0usize;
    let mut dropped = 0usize;

    for block in scanner {
        let block = block?;
        total += 1;

        if let Some(categories) = &options.category_filter {
            if !categories.contains(&block.category) {
                continue;
            }
        }

        let descriptor = match resolve_block(&block, catalog, &path, &header) {
            Ok(d) => d,
            Err(e) if e.is_resolution_error() => match options.policy {
                ResolutionPolicy::Strict => return Err(e),
                ResolutionPolicy::Lenient => {
                    warn!(error = %e, "dropping unresolvable block");
                    dropped += 1;
                    continue;
                }
            },
            Err(e) => return Err(e),
        };

        if let Some(names) = &options.name_filter {
            if !names.contains(&descriptor.name) {
                continue;
            }
        }

        variables.entry(descriptor.name.clone()).or_default().push(descriptor);
    }

    for (name, descriptors) in variables.iter_mut() {
        descriptors.sort_by(|a, b| a.time_start.cmp(&b.time_start));
        check_no_overlap(name, descriptors, &path)?;
    }

    info!(
        path = %path.display(),
        blocks = total,
        dropped,
        variables = variables.len(),
        "indexed bpch file"
    );

    Ok(FileIndex {
        path,
        header,
        grid,
        variables,
    })
}

fn resolve_block(
    block: &VariableBlock,
    catalog: &Catalog,
    path: &Path,
    header: &FileHeader,
) -> BpchResult<VariableDescriptor> {
    let unresolved = || BpchError::MetadataResolution {
        category: block.category.clone(),
        tracer: block.tracer_number,
        path: path.to_path_buf(),
        offset: block.byte_offset,
    };

    let raw = u32::try_from(block.tracer_number).map_err(|_| unresolved())?;
    let tracer = catalog.resolve(&block.category, raw).ok_or_else(unresolved)?;

    let unit = if block.unit.is_empty() {
        tracer.unit.clone()
    } else {
        block.unit.clone()
    };

    Ok(VariableDescriptor {
        name: format!("{}_{}", block.category, tracer.name),
        category: block.category.clone(),
        unit,
        scale_factor: tracer.scale_factor,
        shape: BlockShape::from_dims(block.dims.0, block.dims.1, block.dims.2),
        origin: block.origin,
        time_start: tau_to_datetime(block.tau0),
        time_end: tau_to_datetime(block.tau1),
        tau0: block.tau0,
        tau1: block.tau1,
        path: path.to_path_buf(),
        byte_offset: block.byte_offset,
        byte_size: block.byte_size,
        kind: DataKind::Float32,
        endian: header.endian,
    })
}

/// Reject a variable whose records overlap in time within one file.
///
/// Ranges are half-open `[start, end)`, so instantaneous records with
/// `tau0 == tau1` never collide with their neighbors.
fn check_no_overlap(
    name: &str,
    descriptors: &[VariableDescriptor],
    path: &Path,
) -> BpchResult<()> {
    for pair in descriptors.windows(2) {
        if pair[1].time_start < pair[0].time_end {
            return Err(BpchError::OverlappingRecords {
                path: path.to_path_buf(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn descriptor(name: &str, start_h: i64, end_h: i64) -> VariableDescriptor {
        let base = Utc.with_ymd_and_hms(1985, 1, 1, 0, 0, 0).unwrap();
        VariableDescriptor {
            name: name.to_string(),
            category: "IJ-AVG-$".to_string(),
            unit: "ppbv".to_string(),
            scale_factor: 1e-9,
            shape: BlockShape::Surface { nx: 2, ny: 2 },
            origin: (1, 1, 1),
            time_start: base + chrono::Duration::hours(start_h),
            time_end: base + chrono::Duration::hours(end_h),
            tau0: start_h as f64,
            tau1: end_h as f64,
            path: PathBuf::from("test.bpch"),
            byte_offset: 0,
            byte_size: 16,
            kind: DataKind::Float32,
            endian: Endian::Big,
        }
    }

    #[test]
    fn test_overlap_detected() {
        let d = vec![descriptor("v", 0, 24), descriptor("v", 12, 36)];
        assert!(check_no_overlap("v", &d, Path::new("test.bpch")).is_err());
    }

    #[test]
    fn test_adjacent_ranges_allowed() {
        let d = vec![descriptor("v", 0, 24), descriptor("v", 24, 48)];
        assert!(check_no_overlap("v", &d, Path::new("test.bpch")).is_ok());
    }

    #[test]
    fn test_instantaneous_ranges_allowed() {
        let d = vec![descriptor("v", 0, 0), descriptor("v", 0, 24)];
        assert!(check_no_overlap("v", &d, Path::new("test.bpch")).is_ok());
    }
}
