//! Index building and block reading end to end.

mod common;

use std::collections::HashSet;

use bpch_common::{BlockShape, BpchError, Endian};
use bpch_parser::{
    open_bpch, AccessMode, BlockReader, IndexOptions, ResolutionPolicy,
};
use tempfile::TempDir;
use test_utils::{BlockSpec, BpchBuilder};

#[test]
fn test_scan_and_decode_scenario() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = common::o3_file(&dir, "a.bpch", 0.0, 24.0);

    let index = open_bpch(&path, &catalog, &IndexOptions::default()).unwrap();
    let records = index.get("IJ-AVG-$_O3").expect("variable resolved");
    assert_eq!(records.len(), 1);

    let d = &records[0];
    assert_eq!(d.unit, "ppbv");
    assert_eq!(d.shape, BlockShape::Surface { nx: 2, ny: 2 });
    assert_eq!(d.scale_factor, 1e-9);

    let array = BlockReader::new().read(d, AccessMode::Direct).unwrap();
    let expected: Vec<f32> = [1.0f32, 2.0, 3.0, 4.0]
        .iter()
        .map(|v| (f64::from(*v) * 1e-9) as f32)
        .collect();
    assert_eq!(array.values.as_f32().unwrap(), expected.as_slice());
}

#[test]
fn test_unit_scale_round_trips_bit_for_bit() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = dir.path().join("a.bpch");
    let raw = vec![0.125f32, -3.5, 6.02e23, f32::MIN_POSITIVE];
    BpchBuilder::new()
        .block(
            BlockSpec::new("TIME-SER", 22200 + 22222, (2, 2, 1))
                .unit("molec/cm3")
                .data(raw.clone()),
        )
        .write_to(&path)
        .unwrap();

    let index = open_bpch(&path, &catalog, &IndexOptions::default()).unwrap();
    let d = &index.get("TIME-SER_AIRDEN").unwrap()[0];
    assert_eq!(d.scale_factor, 1.0);

    let array = BlockReader::new().read(d, AccessMode::Direct).unwrap();
    assert_eq!(array.values.as_f32().unwrap(), raw.as_slice());
}

#[test]
fn test_blank_block_unit_falls_back_to_catalog() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = dir.path().join("a.bpch");
    BpchBuilder::new()
        .block(BlockSpec::new("IJ-AVG-$", 2, (2, 2, 1)).unit(""))
        .write_to(&path)
        .unwrap();

    let index = open_bpch(&path, &catalog, &IndexOptions::default()).unwrap();
    assert_eq!(index.get("IJ-AVG-$_O3").unwrap()[0].unit, "ppbv");
}

#[test]
fn test_unknown_tracer_strict_vs_lenient() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = dir.path().join("a.bpch");
    BpchBuilder::new()
        .block(BlockSpec::new("IJ-AVG-$", 2, (2, 2, 1)))
        .block(BlockSpec::new("IJ-AVG-$", 999, (2, 2, 1)))
        .write_to(&path)
        .unwrap();

    let strict = open_bpch(&path, &catalog, &IndexOptions::default());
    assert!(matches!(
        strict,
        Err(BpchError::MetadataResolution { tracer: 999, .. })
    ));

    let lenient = IndexOptions {
        policy: ResolutionPolicy::Lenient,
        ..Default::default()
    };
    let index = open_bpch(&path, &catalog, &lenient).unwrap();
    assert!(index.get("IJ-AVG-$_O3").is_some());
    assert_eq!(index.variables.len(), 1);
}

#[test]
fn test_category_and_name_filters() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = dir.path().join("a.bpch");
    BpchBuilder::new()
        .block(BlockSpec::new("IJ-AVG-$", 1, (2, 2, 1)))
        .block(BlockSpec::new("IJ-AVG-$", 2, (2, 2, 1)))
        // tracer 999 resolves nowhere, but the category filter skips it
        .block(BlockSpec::new("DRYD-FLX", 999, (2, 2, 1)))
        .write_to(&path)
        .unwrap();

    let by_category = IndexOptions {
        category_filter: Some(HashSet::from(["IJ-AVG-$".to_string()])),
        ..Default::default()
    };
    let index = open_bpch(&path, &catalog, &by_category).unwrap();
    assert_eq!(index.variables.len(), 2);

    let by_name = IndexOptions {
        category_filter: Some(HashSet::from(["IJ-AVG-$".to_string()])),
        name_filter: Some(HashSet::from(["IJ-AVG-$_O3".to_string()])),
        ..Default::default()
    };
    let index = open_bpch(&path, &catalog, &by_name).unwrap();
    assert_eq!(index.variables.len(), 1);
    assert!(index.get("IJ-AVG-$_O3").is_some());
}

#[test]
fn test_resolution_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = common::o3_file(&dir, "a.bpch", 0.0, 24.0);

    let first = open_bpch(&path, &catalog, &IndexOptions::default()).unwrap();
    let second = open_bpch(&path, &catalog, &IndexOptions::default()).unwrap();
    let names_a: Vec<_> = first.variable_names().collect();
    let names_b: Vec<_> = second.variable_names().collect();
    assert_eq!(names_a, names_b);
    assert_eq!(first.get("IJ-AVG-$_O3"), second.get("IJ-AVG-$_O3"));
}

#[test]
fn test_mapped_read_matches_direct_read() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = common::o3_file(&dir, "a.bpch", 0.0, 24.0);

    let index = open_bpch(&path, &catalog, &IndexOptions::default()).unwrap();
    let d = &index.get("IJ-AVG-$_O3").unwrap()[0];

    let reader = BlockReader::new();
    let direct = reader.read(d, AccessMode::Direct).unwrap();
    let mapped = reader.read(d, AccessMode::MemoryMapped).unwrap();
    assert_eq!(direct, mapped);
}

#[test]
fn test_mapping_gauge_tracks_open_mappings() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = common::o3_file(&dir, "a.bpch", 0.0, 24.0);

    let index = open_bpch(&path, &catalog, &IndexOptions::default()).unwrap();
    let d = &index.get("IJ-AVG-$_O3").unwrap()[0];

    let reader = BlockReader::new();
    let gauge = reader.gauge();
    assert_eq!(gauge.open_mappings(), 0);

    let first = reader.map(d).unwrap();
    let second = reader.map(d).unwrap();
    assert_eq!(gauge.open_mappings(), 2);

    // a mapping decodes lazily and repeatedly
    let a = first.values().unwrap();
    let b = first.values().unwrap();
    assert_eq!(a, b);

    drop(first);
    assert_eq!(gauge.open_mappings(), 1);
    drop(second);
    assert_eq!(gauge.open_mappings(), 0);
}

#[test]
fn test_little_endian_values_decode() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = dir.path().join("a.bpch");
    BpchBuilder::new()
        .endian(Endian::Little)
        .block(BlockSpec::new("IJ-AVG-$", 2, (2, 2, 1)).data(vec![1.0, 2.0, 3.0, 4.0]))
        .write_to(&path)
        .unwrap();

    let index = open_bpch(&path, &catalog, &IndexOptions::default()).unwrap();
    let d = &index.get("IJ-AVG-$_O3").unwrap()[0];
    assert_eq!(d.endian, Endian::Little);

    let array = BlockReader::new().read(d, AccessMode::Direct).unwrap();
    let expected: Vec<f32> = [1.0f32, 2.0, 3.0, 4.0]
        .iter()
        .map(|v| (f64::from(*v) * 1e-9) as f32)
        .collect();
    assert_eq!(array.values.as_f32().unwrap(), expected.as_slice());
}

#[test]
fn test_overlapping_records_within_one_file_rejected() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = dir.path().join("a.bpch");
    BpchBuilder::new()
        .block(BlockSpec::new("IJ-AVG-$", 2, (2, 2, 1)).taus(0.0, 24.0))
        .block(BlockSpec::new("IJ-AVG-$", 2, (2, 2, 1)).taus(12.0, 36.0))
        .write_to(&path)
        .unwrap();

    assert!(matches!(
        open_bpch(&path, &catalog, &IndexOptions::default()),
        Err(BpchError::OverlappingRecords { .. })
    ));
}

#[test]
fn test_unknown_model_is_unknown_grid() {
    let dir = TempDir::new().unwrap();
    let catalog = common::catalog(&dir);
    let path = dir.path().join("a.bpch");
    BpchBuilder::new()
        .model("FUTURE-MODEL", (5.0, 4.0))
        .block(BlockSpec::new("IJ-AVG-$", 2, (2, 2, 1)))
        .write_to(&path)
        .unwrap();

    assert!(matches!(
        open_bpch(&path, &catalog, &IndexOptions::default()),
        Err(BpchError::UnknownGrid { .. })
    ));
}
