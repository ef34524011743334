#![allow(dead_code)]

use std::path::PathBuf;

use bpch_catalog::{load_catalog, Catalog, CatalogConfig};
use tempfile::TempDir;
use test_utils::{BlockSpec, BpchBuilder};

/// Load the shared fixture catalogs into a temp dir.
pub fn catalog(dir: &TempDir) -> Catalog {
    let (tracerinfo, diaginfo) = test_utils::write_default_catalogs(dir.path()).unwrap();
    let (catalog, issues) = load_catalog(&CatalogConfig::new(tracerinfo, diaginfo)).unwrap();
    assert!(issues.is_empty(), "fixture catalogs should be clean: {:?}", issues);
    catalog
}

/// Write a one-variable file: O3 concentration over `[tau0, tau1)`.
pub fn o3_file(dir: &TempDir, name: &str, tau0: f64, tau1: f64) -> PathBuf {
    let path = dir.path().join(name);
    BpchBuilder::new()
        .block(
            BlockSpec::new("IJ-AVG-$", 2, (2, 2, 1))
                .taus(tau0, tau1)
                .data(vec![1.0, 2.0, 3.0, 4.0]),
        )
        .write_to(&path)
        .unwrap();
    path
}
