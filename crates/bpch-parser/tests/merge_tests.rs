//! Multi-file merging and the dataset boundary.

mod common;

use bpch_common::BpchError;
use bpch_parser::{
    export_variables, merge, open_bpch, AccessMode, Axis, BlockReader, FileIndex, IndexOptions,
};
use tempfile::TempDir;
use test_utils::{BlockSpec, BpchBuilder};

fn indexed_o3(dir: &TempDir, name: &str, tau0: f64, tau1: f64) -> FileIndex {
    let catalog = common::catalog(dir);
    let path = common::o3_file(dir, name, tau0, tau1);
    open_bpch(&path, &catalog, &IndexOptions::default()).unwrap()
}

#[test]
fn test_disjoint_windows_merge_sorted() {
    let dir = TempDir::new().unwrap();
    // supplied out of time order on purpose
    let later = indexed_o3(&dir, "b.bpch", 24.0, 48.0);
    let earlier = indexed_o3(&dir, "a.bpch", 0.0, 24.0);

    let merged = merge(&[later, earlier]).unwrap();
    let records = merged.get("IJ-AVG-$_O3").unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].time_start < records[1].time_start);
    assert_eq!(records[0].tau0, 0.0);
    assert_eq!(records[1].tau0, 24.0);
}

#[test]
fn test_self_merge_is_rejected_not_deduped() {
    let dir = TempDir::new().unwrap();
    let index = indexed_o3(&dir, "a.bpch", 0.0, 24.0);

    let result = merge(&[index.clone(), index]);
    assert!(matches!(
        result,
        Err(BpchError::OverlappingTimeRange { .. })
    ));
}

#[test]
fn test_merge_is_order_insensitive() {
    let dir = TempDir::new().unwrap();
    let a = indexed_o3(&dir, "a.bpch", 0.0, 24.0);
    let b = indexed_o3(&dir, "b.bpch", 24.0, 48.0);
    let c = indexed_o3(&dir, "c.bpch", 48.0, 72.0);

    let abc = merge(&[a.clone(), b.clone(), c.clone()]).unwrap();
    let cab = merge(&[c, a, b]).unwrap();

    assert_eq!(abc.variables, cab.variables);
    assert_eq!(abc.grid, cab.grid);
}

#[test]
fn test_grid_mismatch_names_offending_file() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let a = indexed_o3(&dir, "a.bpch", 0.0, 24.0);

    let other_path = dir.path().join("geos4.bpch");
    BpchBuilder::new()
        .model("GEOS4", (5.0, 4.0))
        .block(
            BlockSpec::new("IJ-AVG-$", 2, (2, 2, 1))
                .taus(24.0, 48.0)
                .data(vec![1.0, 2.0, 3.0, 4.0]),
        )
        .write_to(&other_path)
        .unwrap();
    let other = open_bpch(&other_path, &catalog, &IndexOptions::default()).unwrap();

    match merge(&[a, other]) {
        Err(BpchError::GridMismatch { path }) => assert_eq!(path, other_path),
        other => panic!("expected GridMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_variable_set_mismatch_is_schema_error() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let a = indexed_o3(&dir, "a.bpch", 0.0, 24.0);

    let nox_path = dir.path().join("nox.bpch");
    BpchBuilder::new()
        .block(BlockSpec::new("IJ-AVG-$", 1, (2, 2, 1)).taus(24.0, 48.0))
        .write_to(&nox_path)
        .unwrap();
    let nox = open_bpch(&nox_path, &catalog, &IndexOptions::default()).unwrap();

    match merge(&[a, nox]) {
        Err(BpchError::SchemaMismatch { path, detail }) => {
            assert_eq!(path, nox_path);
            assert!(detail.contains("IJ-AVG-$_O3"));
        }
        other => panic!("expected SchemaMismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_merging_nothing_is_an_error() {
    assert!(matches!(
        merge(&[]),
        Err(BpchError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_export_packages_time_coordinate() {
    let dir = TempDir::new().unwrap();
    let a = indexed_o3(&dir, "a.bpch", 0.0, 24.0);
    let b = indexed_o3(&dir, "b.bpch", 24.0, 48.0);
    let merged = merge(&[a, b]).unwrap();

    let reader = BlockReader::new();
    let exports = export_variables(&merged, &reader);
    assert_eq!(exports.len(), 1);

    let var = &exports[0];
    assert_eq!(var.name, "IJ_AVG_S_O3");
    assert_eq!(var.unit, "ppbv");
    assert_eq!(var.axes, vec![Axis::Time, Axis::Lon, Axis::Lat]);
    assert!(!var.time_invariant);
    assert_eq!(var.times.len(), 2);
    assert!(var.times[0] < var.times[1]);
    assert_eq!(var.time_bounds[0].1, var.times[1]);

    // surface field windowed at the grid origin
    assert_eq!(var.coordinates.lon.len(), 2);
    assert_eq!(var.coordinates.lat.len(), 2);
    assert!(var.coordinates.lev.is_empty());

    let record = var.source.read(0, AccessMode::Direct).unwrap();
    let expected: Vec<f32> = [1.0f32, 2.0, 3.0, 4.0]
        .iter()
        .map(|v| (f64::from(*v) * 1e-9) as f32)
        .collect();
    assert_eq!(record.values.as_f32().unwrap(), expected.as_slice());
}

#[test]
fn test_export_flags_time_invariant_variables() {
    let dir = TempDir::new().unwrap();
    let merged = merge(&[indexed_o3(&dir, "a.bpch", 0.0, 0.0)]).unwrap();

    let reader = BlockReader::new();
    let exports = export_variables(&merged, &reader);
    assert!(exports[0].time_invariant);
    assert_eq!(exports[0].source.len(), 1);
}
