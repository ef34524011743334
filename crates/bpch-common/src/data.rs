//! Wire-level value types for bpch records.
//!
//! Block shape and element type are a small closed set of variants rather
//! than open-ended runtime typing: bpch output is either a 2-D surface
//! field or a 3-D volumetric field, stored as 32-bit floats (or, rarely,
//! 32-bit integer counters).

use serde::{Deserialize, Serialize};

/// Byte order of a bpch file.
///
/// GEOS-Chem output is conventionally big-endian (written on big-endian
/// hardware in the format's era), but little-endian files exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    pub fn read_u32(self, b: [u8; 4]) -> u32 {
        match self {
            Endian::Big => u32::from_be_bytes(b),
            Endian::Little => u32::from_le_bytes(b),
        }
    }

    pub fn read_i32(self, b: [u8; 4]) -> i32 {
        match self {
            Endian::Big => i32::from_be_bytes(b),
            Endian::Little => i32::from_le_bytes(b),
        }
    }

    pub fn read_f32(self, b: [u8; 4]) -> f32 {
        match self {
            Endian::Big => f32::from_be_bytes(b),
            Endian::Little => f32::from_le_bytes(b),
        }
    }

    pub fn read_f64(self, b: [u8; 8]) -> f64 {
        match self {
            Endian::Big => f64::from_be_bytes(b),
            Endian::Little => f64::from_le_bytes(b),
        }
    }

    pub fn u32_bytes(self, v: u32) -> [u8; 4] {
        match self {
            Endian::Big => v.to_be_bytes(),
            Endian::Little => v.to_le_bytes(),
        }
    }

    pub fn i32_bytes(self, v: i32) -> [u8; 4] {
        match self {
            Endian::Big => v.to_be_bytes(),
            Endian::Little => v.to_le_bytes(),
        }
    }

    pub fn f32_bytes(self, v: f32) -> [u8; 4] {
        match self {
            Endian::Big => v.to_be_bytes(),
            Endian::Little => v.to_le_bytes(),
        }
    }

    pub fn f64_bytes(self, v: f64) -> [u8; 8] {
        match self {
            Endian::Big => v.to_be_bytes(),
            Endian::Little => v.to_le_bytes(),
        }
    }
}

/// Element type of a block's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataKind {
    /// IEEE 754 single-precision float (the bpch default).
    Float32,
    /// 32-bit signed integer (integer-only diagnostic counters).
    Int32,
}

impl DataKind {
    /// Size of one element in bytes.
    pub fn size(self) -> u64 {
        4
    }
}

/// Shape of one decoded block.
///
/// `nz == 1` in the block header collapses to a surface field; everything
/// else is volumetric. Storage order inside the payload is Fortran
/// (column-major, x fastest) and is preserved, not reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockShape {
    Surface { nx: usize, ny: usize },
    Volume { nx: usize, ny: usize, nz: usize },
}

impl BlockShape {
    pub fn from_dims(nx: usize, ny: usize, nz: usize) -> Self {
        if nz == 1 {
            BlockShape::Surface { nx, ny }
        } else {
            BlockShape::Volume { nx, ny, nz }
        }
    }

    /// The dimension triple `(nx, ny, nz)`; surface fields report `nz == 1`.
    pub fn dims(self) -> (usize, usize, usize) {
        match self {
            BlockShape::Surface { nx, ny } => (nx, ny, 1),
            BlockShape::Volume { nx, ny, nz } => (nx, ny, nz),
        }
    }

    /// Total element count.
    pub fn len(self) -> usize {
        let (nx, ny, nz) = self.dims();
        nx * ny * nz
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Number of axes (2 for surface fields, 3 for volumetric).
    pub fn ndim(self) -> usize {
        match self {
            BlockShape::Surface { .. } => 2,
            BlockShape::Volume { .. } => 3,
        }
    }
}

/// Decoded payload values.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValues {
    Float32(Vec<f32>),
    Int32(Vec<i32>),
}

impl DataValues {
    pub fn len(&self) -> usize {
        match self {
            DataValues::Float32(v) => v.len(),
            DataValues::Int32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Float view of the values; `None` for integer-only fields.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            DataValues::Float32(v) => Some(v),
            DataValues::Int32(_) => None,
        }
    }
}

/// One decoded, scaled block: values plus their declared shape.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub shape: BlockShape,
    pub values: DataValues,
}

impl DataArray {
    pub fn new(shape: BlockShape, values: DataValues) -> Self {
        debug_assert_eq!(shape.len(), values.len());
        Self { shape, values }
    }
}
