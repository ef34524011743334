//! Error types for bpch reading operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using BpchError.
pub type BpchResult<T> = Result<T, BpchError>;

/// Primary error type for bpch operations.
///
/// Every variant produced while walking a file names the offending path and,
/// where meaningful, the byte offset, so a caller can report errors against
/// multi-GB inputs without re-scanning them.
#[derive(Debug, Error)]
pub enum BpchError {
    // === Scan-time errors ===
    #[error("{}: corrupt record at byte {offset}: {detail}", .path.display())]
    CorruptRecord {
        path: PathBuf,
        offset: u64,
        detail: String,
    },

    // === Catalog errors ===
    #[error("{}:{line}: bad catalog line: {detail}", .file.display())]
    CatalogParse {
        file: PathBuf,
        line: usize,
        detail: String,
    },

    // === Grid errors ===
    #[error("no grid registered for model '{model}' at resolution {resolution:?}")]
    UnknownGrid {
        model: String,
        resolution: (f64, f64),
    },

    // === Index-build errors ===
    #[error(
        "{}: cannot resolve tracer {tracer} in category '{category}' (block at byte {offset})",
        .path.display()
    )]
    MetadataResolution {
        category: String,
        tracer: i32,
        path: PathBuf,
        offset: u64,
    },

    #[error("{}: descriptors for '{name}' overlap in time within one file", .path.display())]
    OverlappingRecords { path: PathBuf, name: String },

    // === Merge-time errors ===
    #[error("{}: grid does not match the first file in the merge set", .path.display())]
    GridMismatch { path: PathBuf },

    #[error("{}: variable set mismatch: {detail}", .path.display())]
    SchemaMismatch { path: PathBuf, detail: String },

    #[error(
        "variable '{name}': overlapping time ranges between {} and {}",
        .path_a.display(), .path_b.display()
    )]
    OverlappingTimeRange {
        name: String,
        path_a: PathBuf,
        path_b: PathBuf,
    },

    // === Resource errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BpchError {
    /// Whether this error is fatal for the file being scanned.
    ///
    /// Per-block resolution failures may be dropped under a lenient policy;
    /// everything else aborts the operation that produced it.
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, BpchError::MetadataResolution { .. })
    }
}
