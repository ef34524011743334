//! Dataset assembler boundary.
//!
//! The core stops at descriptors plus a repeatable "produce array"
//! operation; how a consumer turns those into its own labeled-array or
//! dataset container is its business. This module packages a merged index
//! into per-variable exports: a sanitized name, axis labels, the ordered
//! time coordinate, spatial coordinate vectors, and a [`BlockSource`] handle
//! whose reads are safe to issue from worker tasks.

use chrono::{DateTime, Utc};

use bpch_common::{BlockShape, BpchResult, DataArray, GridSpec};

use crate::index::VariableDescriptor;
use crate::merge::MergedIndex;
use crate::reader::{AccessMode, BlockReader};

/// Semantic axis labels for an exported variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Time,
    Lon,
    Lat,
    Lev,
}

/// Replace characters that downstream naming conventions reject:
/// `$` becomes `S`; `:`, `=` and `-` become `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '$' => 'S',
            ':' | '=' | '-' => '_',
            other => other,
        })
        .collect()
}

/// Spatial coordinate vectors for one variable's block window.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// Vertical level centers; empty for surface fields.
    pub lev: Vec<f64>,
}

/// Compute the coordinate window a descriptor's block covers.
///
/// Nested-grid output stores a sub-window of the model grid; the 1-indexed
/// origin in the block header shifts the lon/lat vectors accordingly.
pub fn coordinates(grid: &GridSpec, descriptor: &VariableDescriptor) -> Coordinates {
    let (nx, ny, nz) = descriptor.shape.dims();
    let (i0, j0, _) = descriptor.origin;

    let window = |centers: Vec<f64>, start: usize, count: usize| -> Vec<f64> {
        centers
            .into_iter()
            .skip(start.saturating_sub(1))
            .take(count)
            .collect()
    };

    let lev = match descriptor.shape {
        BlockShape::Surface { .. } => Vec::new(),
        BlockShape::Volume { .. } => grid.level_centers().into_iter().take(nz).collect(),
    };

    Coordinates {
        lon: window(grid.lon_centers(), i0, nx),
        lat: window(grid.lat_centers(), j0, ny),
        lev,
    }
}

/// Handle for reading one variable's records.
///
/// Descriptors are immutable and reads consult only the originating
/// read-only files, so a `BlockSource` may be shared across worker tasks.
#[derive(Debug, Clone)]
pub struct BlockSource {
    descriptors: Vec<VariableDescriptor>,
    reader: BlockReader,
}

impl BlockSource {
    /// Number of time records.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptor(&self, record: usize) -> Option<&VariableDescriptor> {
        self.descriptors.get(record)
    }

    /// Decode record `record` (by time order).
    pub fn read(&self, record: usize, mode: AccessMode) -> BpchResult<DataArray> {
        let descriptor = &self.descriptors[record];
        self.reader.read(descriptor, mode)
    }
}

/// Everything a consumer needs to materialize one variable.
#[derive(Debug, Clone)]
pub struct VariableExport {
    /// Sanitized variable name.
    pub name: String,
    pub unit: String,
    /// Axis labels, time first, matching `(len, nx, ny[, nz])`.
    pub axes: Vec<Axis>,
    /// Time coordinate, one entry per record, ascending.
    pub times: Vec<DateTime<Utc>>,
    /// `[start, end)` validity bounds per record.
    pub time_bounds: Vec<(DateTime<Utc>, DateTime<Utc>)>,
    /// Single-record variables carry no meaningful time axis.
    pub time_invariant: bool,
    pub coordinates: Coordinates,
    pub source: BlockSource,
}

/// Package every merged variable for the consumer.
pub fn export_variables(merged: &MergedIndex, reader: &BlockReader) -> Vec<VariableExport> {
    merged
        .variables
        .iter()
        .map(|(name, descriptors)| {
            let first = &descriptors[0];
            let mut axes = vec![Axis::Time, Axis::Lon, Axis::Lat];
            if matches!(first.shape, BlockShape::Volume { .. }) {
                axes.push(Axis::Lev);
            }

            VariableExport {
                name: sanitize_name(name),
                unit: first.unit.clone(),
                axes,
                times: descriptors.iter().map(|d| d.time_start).collect(),
                time_bounds: descriptors
                    .iter()
                    .map(|d| (d.time_start, d.time_end))
                    .collect(),
                time_invariant: descriptors.len() == 1,
                coordinates: coordinates(&merged.grid, first),
                source: BlockSource {
                    descriptors: descriptors.clone(),
                    reader: reader.clone(),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("IJ-AVG-$_O3"), "IJ_AVG_S_O3");
        assert_eq!(sanitize_name("DRYD-FLX_NOx"), "DRYD_FLX_NOx");
        assert_eq!(sanitize_name("a:b=c"), "a_b_c");
        assert_eq!(sanitize_name("plain"), "plain");
    }
}
