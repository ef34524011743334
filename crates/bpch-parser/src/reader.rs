//! Lazy block reader.
//!
//! Turns a [`VariableDescriptor`] into array data on demand. Two access
//! modes: `Direct` opens, seeks, reads and closes within the call, so no
//! handle outlives it; `MemoryMapped` holds a read-only mapping until the
//! returned [`MappedBlock`] is dropped, and a shared gauge counts open
//! mappings so a caller can bound how many are in flight at once.
//!
//! Reads are independent and touch no shared mutable state, so they are safe
//! to issue concurrently across variables and records.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use memmap2::Mmap;
use tracing::trace;

use bpch_common::{BpchError, BpchResult, DataArray, DataKind, DataValues, Endian};

use crate::index::VariableDescriptor;

/// How a block's bytes are brought into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Open, read, decode and close within the call.
    Direct,
    /// Map the file read-only and decode from the mapping.
    MemoryMapped,
}

/// Shared count of currently open mappings.
///
/// The reader enforces no cap; it only counts, so an external scheduler can
/// decide when to stop issuing mapped reads.
#[derive(Debug, Clone, Default)]
pub struct MappingGauge(Arc<AtomicUsize>);

impl MappingGauge {
    pub fn open_mappings(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> MappingGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        MappingGuard(Arc::clone(&self.0))
    }
}

/// Decrements the gauge when a mapping goes away, on every exit path.
#[derive(Debug)]
struct MappingGuard(Arc<AtomicUsize>);

impl Drop for MappingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Stateless block reader; clones share one mapping gauge.
#[derive(Debug, Clone, Default)]
pub struct BlockReader {
    gauge: MappingGauge,
}

impl BlockReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gauge(&self) -> MappingGauge {
        self.gauge.clone()
    }

    /// Read one block as a materialized, scaled array.
    pub fn read(&self, descriptor: &VariableDescriptor, mode: AccessMode) -> BpchResult<DataArray> {
        match mode {
            AccessMode::Direct => self.read_direct(descriptor),
            AccessMode::MemoryMapped => {
                // mapping lives only for the duration of the decode
                let mapped = self.map(descriptor)?;
                mapped.values()
            }
        }
    }

    /// Map one block for deferred decoding.
    pub fn map(&self, descriptor: &VariableDescriptor) -> BpchResult<MappedBlock> {
        let file = File::open(&descriptor.path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let guard = self.gauge.acquire();

        let start = descriptor.byte_offset as usize;
        let end = start + descriptor.byte_size as usize;
        if mmap.len() < end + 4 || start < 4 {
            return Err(BpchError::CorruptRecord {
                path: descriptor.path.clone(),
                offset: descriptor.byte_offset,
                detail: format!(
                    "mapped file is {} bytes, block needs {}..{} plus framing",
                    mmap.len(),
                    start,
                    end
                ),
            });
        }
        let mut lead = [0u8; 4];
        lead.copy_from_slice(&mmap[start - 4..start]);
        let mut trail = [0u8; 4];
        trail.copy_from_slice(&mmap[end..end + 4]);
        verify_framing(descriptor, lead, trail)?;

        trace!(
            path = %descriptor.path.display(),
            offset = descriptor.byte_offset,
            "mapped block"
        );

        Ok(MappedBlock {
            descriptor: descriptor.clone(),
            mmap,
            range: start..end,
            _guard: guard,
        })
    }

    fn read_direct(&self, descriptor: &VariableDescriptor) -> BpchResult<DataArray> {
        if descriptor.byte_offset < 4 {
            return Err(BpchError::CorruptRecord {
                path: descriptor.path.clone(),
                offset: descriptor.byte_offset,
                detail: "payload offset leaves no room for a length prefix".to_string(),
            });
        }
        let mut file = File::open(&descriptor.path)?;
        file.seek(SeekFrom::Start(descriptor.byte_offset - 4))?;

        let mut prefix = [0u8; 4];
        file.read_exact(&mut prefix)?;
        let mut payload = vec![0u8; descriptor.byte_size as usize];
        file.read_exact(&mut payload)?;
        let mut suffix = [0u8; 4];
        file.read_exact(&mut suffix)?;

        verify_framing(descriptor, prefix, suffix)?;
        decode(descriptor, &payload)
    }
}

/// One block held in a read-only file mapping, decoded on demand.
#[derive(Debug)]
pub struct MappedBlock {
    descriptor: VariableDescriptor,
    mmap: Mmap,
    range: Range<usize>,
    _guard: MappingGuard,
}

impl MappedBlock {
    pub fn descriptor(&self) -> &VariableDescriptor {
        &self.descriptor
    }

    /// Raw undecoded payload bytes.
    pub fn raw(&self) -> &[u8] {
        &self.mmap[self.range.clone()]
    }

    /// Decode and scale the payload.
    pub fn values(&self) -> BpchResult<DataArray> {
        decode(&self.descriptor, self.raw())
    }
}

fn verify_framing(
    descriptor: &VariableDescriptor,
    prefix: [u8; 4],
    suffix: [u8; 4],
) -> BpchResult<()> {
    let endian = descriptor.endian;
    let lead = endian.read_u32(prefix);
    let trail = endian.read_u32(suffix);
    if u64::from(lead) != descriptor.byte_size || lead != trail {
        return Err(BpchError::CorruptRecord {
            path: descriptor.path.clone(),
            offset: descriptor.byte_offset,
            detail: format!(
                "framing markers ({}, {}) do not bracket a {}-byte payload",
                lead, trail, descriptor.byte_size
            ),
        });
    }
    Ok(())
}

/// Decode a payload per the descriptor's element kind, applying the catalog
/// scale factor. Scaling happens in f64 and lands in f32; integer fields are
/// returned unscaled.
fn decode(descriptor: &VariableDescriptor, payload: &[u8]) -> BpchResult<DataArray> {
    let expected = descriptor.shape.len() * descriptor.kind.size() as usize;
    if payload.len() != expected {
        return Err(BpchError::CorruptRecord {
            path: descriptor.path.clone(),
            offset: descriptor.byte_offset,
            detail: format!(
                "payload is {} bytes but shape requires {}",
                payload.len(),
                expected
            ),
        });
    }

    let endian = descriptor.endian;
    let values = match descriptor.kind {
        DataKind::Float32 => DataValues::Float32(
            payload
                .chunks_exact(4)
                .map(|c| {
                    let raw = endian.read_f32([c[0], c[1], c[2], c[3]]);
                    (f64::from(raw) * descriptor.scale_factor) as f32
                })
                .collect(),
        ),
        DataKind::Int32 => DataValues::Int32(
            payload
                .chunks_exact(4)
                .map(|c| endian.read_i32([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
    };

    Ok(DataArray::new(descriptor.shape, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpch_common::{tau_to_datetime, BlockShape};
    use std::path::PathBuf;

    fn descriptor(scale: f64) -> VariableDescriptor {
        VariableDescriptor {
            name: "IJ-AVG-$_O3".to_string(),
            category: "IJ-AVG-$".to_string(),
            unit: "ppbv".to_string(),
            scale_factor: scale,
            shape: BlockShape::Surface { nx: 2, ny: 2 },
            origin: (1, 1, 1),
            time_start: tau_to_datetime(0.0),
            time_end: tau_to_datetime(0.0),
            tau0: 0.0,
            tau1: 0.0,
            path: PathBuf::from("test.bpch"),
            byte_offset: 4,
            byte_size: 16,
            kind: DataKind::Float32,
            endian: Endian::Big,
        }
    }

    fn payload(values: &[f32], endian: Endian) -> Vec<u8> {
        values.iter().flat_map(|v| endian.f32_bytes(*v)).collect()
    }

    #[test]
    fn test_decode_applies_scale() {
        let d = descriptor(1e-9);
        let arr = decode(&d, &payload(&[1.0, 2.0, 3.0, 4.0], Endian::Big)).unwrap();
        let expected: Vec<f32> = [1.0f32, 2.0, 3.0, 4.0]
            .iter()
            .map(|v| (f64::from(*v) * 1e-9) as f32)
            .collect();
        assert_eq!(arr.values.as_f32().unwrap(), expected.as_slice());
    }

    #[test]
    fn test_decode_unit_scale_is_bit_exact() {
        let d = descriptor(1.0);
        let raw = [0.1f32, -2.5, 1e30, f32::MIN_POSITIVE];
        let arr = decode(&d, &payload(&raw, Endian::Big)).unwrap();
        assert_eq!(arr.values.as_f32().unwrap(), raw.as_slice());
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        let d = descriptor(1.0);
        assert!(decode(&d, &payload(&[1.0, 2.0], Endian::Big)).is_err());
    }

    #[test]
    fn test_gauge_counts_guards() {
        let gauge = MappingGauge::default();
        assert_eq!(gauge.open_mappings(), 0);
        let a = gauge.acquire();
        let b = gauge.acquire();
        assert_eq!(gauge.open_mappings(), 2);
        drop(a);
        assert_eq!(gauge.open_mappings(), 1);
        drop(b);
        assert_eq!(gauge.open_mappings(), 0);
    }
}
