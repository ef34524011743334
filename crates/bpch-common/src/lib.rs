//! Common types shared across the bpch-rs workspace.
//!
//! This crate carries the pieces every other member needs: the error
//! taxonomy, tau timestamp conversion, the wire-level value types
//! (endianness, element kind, block shape) and the static grid registry
//! for GEOS-Chem model configurations.

pub mod data;
pub mod error;
pub mod grid;
pub mod time;

pub use data::{BlockShape, DataArray, DataKind, DataValues, Endian};
pub use error::{BpchError, BpchResult};
pub use grid::{resolve_grid, GridSpec};
pub use time::{datetime_to_tau, tau_to_datetime, TAU_UNIT_STR};
