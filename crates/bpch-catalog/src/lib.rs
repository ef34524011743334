//! Metadata catalog loader for GEOS-Chem bpch output.
//!
//! bpch block headers identify variables by opaque numeric tracer codes.
//! Two external fixed-width text catalogs resolve them: `tracerinfo.dat`
//! maps tracer numbers to names, units and scale factors, and
//! `diaginfo.dat` maps diagnostic category names to the numbering offset
//! that disambiguates tracer codes across categories.
//!
//! Catalog paths are always explicit; there is no implicit current-directory
//! lookup and no process-wide default. A loaded [`Catalog`] is immutable and
//! can be shared across any number of file opens.

pub mod diaginfo;
pub mod tracerinfo;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bpch_common::BpchResult;
use tracing::warn;

pub use diaginfo::CategoryOffset;
pub use tracerinfo::TracerDefinition;

/// Explicit locations of the two catalog files.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub tracerinfo_path: PathBuf,
    pub diaginfo_path: PathBuf,
}

impl CatalogConfig {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(tracerinfo: P, diaginfo: Q) -> Self {
        Self {
            tracerinfo_path: tracerinfo.as_ref().to_path_buf(),
            diaginfo_path: diaginfo.as_ref().to_path_buf(),
        }
    }
}

/// One recoverable catalog problem: a malformed or duplicate line that was
/// skipped while the rest of the file loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub file: PathBuf,
    pub line: usize,
    pub detail: String,
}

impl std::fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.detail)
    }
}

/// Immutable lookup tables loaded from tracerinfo/diaginfo.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracers: HashMap<u32, TracerDefinition>,
    offsets: HashMap<String, u32>,
}

impl Catalog {
    /// Number of tracer definitions.
    pub fn tracer_count(&self) -> usize {
        self.tracers.len()
    }

    /// Number of category offsets.
    pub fn category_count(&self) -> usize {
        self.offsets.len()
    }

    /// Numbering offset for a diagnostic category, if known.
    pub fn category_offset(&self, category: &str) -> Option<u32> {
        self.offsets.get(category).copied()
    }

    /// Tracer definition by its catalog number.
    pub fn tracer(&self, number: u32) -> Option<&TracerDefinition> {
        self.tracers.get(&number)
    }

    /// Resolve a block's `(category, raw tracer number)` pair.
    ///
    /// The raw number is reduced by the category's offset when it exceeds
    /// it, forming the within-category catalog key. Returns `None` when the
    /// category is absent from diaginfo or the reduced number is absent from
    /// tracerinfo; the caller decides whether that is fatal.
    pub fn resolve(&self, category: &str, raw_number: u32) -> Option<&TracerDefinition> {
        let offset = self.category_offset(category)?;
        let resolved = if raw_number > offset {
            raw_number - offset
        } else {
            raw_number
        };
        self.tracers.get(&resolved)
    }
}

/// Load both catalogs.
///
/// A malformed line (wrong column layout, non-numeric field) or a duplicate
/// key does not abort the load: the line is skipped, recorded as a
/// [`CatalogIssue`], and parsing continues, so one bad record never hides
/// the rest of a file. Only I/O failure is an `Err`.
pub fn load_catalog(config: &CatalogConfig) -> BpchResult<(Catalog, Vec<CatalogIssue>)> {
    let mut issues = Vec::new();

    let tracers = tracerinfo::load(&config.tracerinfo_path, &mut issues)?;
    let offsets = diaginfo::load(&config.diaginfo_path, &mut issues)?;

    for issue in &issues {
        warn!(%issue, "skipped catalog line");
    }

    Ok((Catalog { tracers, offsets }, issues))
}

/// Slice a fixed-width column out of a catalog line.
///
/// Lines may be shorter than the full layout when trailing fields are blank;
/// the slice is clamped to the line length. Returns `None` only when the
/// clamp lands inside a multi-byte character.
pub(crate) fn column(line: &str, start: usize, end: usize) -> Option<&str> {
    let start = start.min(line.len());
    let end = end.min(line.len());
    line.get(start..end).map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(tracers: Vec<TracerDefinition>, offsets: Vec<(&str, u32)>) -> Catalog {
        Catalog {
            tracers: tracers.into_iter().map(|t| (t.tracer_number, t)).collect(),
            offsets: offsets
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    fn tracer(number: u32, name: &str) -> TracerDefinition {
        TracerDefinition {
            tracer_number: number,
            name: name.to_string(),
            full_name: format!("{} tracer", name),
            unit: "ppbv".to_string(),
            scale_factor: 1e-9,
            molecular_weight: Some(48e-3),
            hydrocarbon: false,
        }
    }

    #[test]
    fn test_resolve_zero_offset() {
        let cat = catalog_with(vec![tracer(2, "O3")], vec![("IJ-AVG-$", 0)]);
        assert_eq!(cat.resolve("IJ-AVG-$", 2).unwrap().name, "O3");
    }

    #[test]
    fn test_resolve_applies_offset() {
        let cat = catalog_with(vec![tracer(4, "NOx")], vec![("DRYD-FLX", 7100)]);
        assert_eq!(cat.resolve("DRYD-FLX", 7104).unwrap().name, "NOx");
    }

    #[test]
    fn test_resolve_below_offset_is_unreduced() {
        let cat = catalog_with(vec![tracer(4, "NOx")], vec![("DRYD-FLX", 7100)]);
        // 4 <= 7100, so the raw number is used as-is
        assert_eq!(cat.resolve("DRYD-FLX", 4).unwrap().name, "NOx");
    }

    #[test]
    fn test_resolve_unknown_category() {
        let cat = catalog_with(vec![tracer(2, "O3")], vec![("IJ-AVG-$", 0)]);
        assert!(cat.resolve("NO-SUCH", 2).is_none());
    }

    #[test]
    fn test_resolve_unknown_number() {
        let cat = catalog_with(vec![tracer(2, "O3")], vec![("IJ-AVG-$", 0)]);
        assert!(cat.resolve("IJ-AVG-$", 999).is_none());
    }

    #[test]
    fn test_column_clamps_short_lines() {
        assert_eq!(column("abc", 0, 8), Some("abc"));
        assert_eq!(column("abc", 5, 8), Some(""));
    }
}
