//! GEOS-Chem binary punch ("bpch") file reader.
//!
//! bpch files are self-describing but index-free: a sequence of Fortran
//! unformatted records with no table of contents, so random access requires
//! one full forward walk first. This crate separates that walk from data
//! access:
//!
//! 1. [`Scanner`] walks a file once and emits raw block positions.
//! 2. [`build_index`] joins blocks with a [`bpch_catalog::Catalog`] and the
//!    grid registry into a per-file [`FileIndex`] of resolved descriptors.
//! 3. [`BlockReader`] turns any descriptor into array data on demand, by
//!    direct read or memory mapping.
//! 4. [`merge`] aligns several files' indexes along the time axis.
//! 5. [`export_variables`] packages the result for an external dataset
//!    container.
//!
//! ```no_run
//! use bpch_catalog::{load_catalog, CatalogConfig};
//! use bpch_parser::{open_bpch, AccessMode, BlockReader, IndexOptions};
//!
//! # fn main() -> bpch_common::BpchResult<()> {
//! let config = CatalogConfig::new("tracerinfo.dat", "diaginfo.dat");
//! let (catalog, _issues) = load_catalog(&config)?;
//!
//! let index = open_bpch("ctm.bpch".as_ref(), &catalog, &IndexOptions::default())?;
//! let reader = BlockReader::new();
//! for (name, records) in &index.variables {
//!     let array = reader.read(&records[0], AccessMode::Direct)?;
//!     println!("{}: {:?}", name, array.shape);
//! }
//! # Ok(())
//! # }
//! ```

pub mod dataset;
pub mod index;
pub mod merge;
pub mod reader;
mod record;
pub mod scanner;

use std::path::Path;

use bpch_catalog::Catalog;
use bpch_common::BpchResult;

pub use dataset::{export_variables, Axis, BlockSource, Coordinates, VariableExport};
pub use index::{build_index, FileIndex, IndexOptions, ResolutionPolicy, VariableDescriptor};
pub use merge::{merge, MergedIndex};
pub use reader::{AccessMode, BlockReader, MappedBlock, MappingGauge};
pub use scanner::{FileHeader, Scanner, VariableBlock};

/// Scan and index one file in a single call.
pub fn open_bpch(path: &Path, catalog: &Catalog, options: &IndexOptions) -> BpchResult<FileIndex> {
    let scanner = Scanner::open(path)?;
    build_index(scanner, catalog, options)
}
