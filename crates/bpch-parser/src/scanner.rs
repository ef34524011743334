//! Single-pass block scanner.
//!
//! A bpch file carries no index: the only way to learn where a block's data
//! lives is to walk every record from the start and add up sizes. The
//! scanner does exactly that, once, emitting one [`VariableBlock`] per data
//! block with the payload's byte position recorded but its bytes untouched.
//!
//! File layout:
//!
//! ```text
//! record: filetype      40 bytes, space padded
//! record: title         80 bytes, space padded
//! per block:
//!   record: model line  20s f32 f32 i32 i32   (36 bytes)
//!   record: header line 40s i32 40s f64 f64 40s 7*i32   (168 bytes)
//!   record: payload     nx*ny*nz f32, Fortran order
//! ```
//!
//! The model line repeats before every block; the first one is folded into
//! the [`FileHeader`]. Scanning is forward-only and fails fast: the first
//! framing mismatch poisons the iterator.

use std::path::Path;

use tracing::debug;

use bpch_common::{BpchResult, Endian};

use crate::record::RecordReader;

const FILETYPE_LEN: usize = 40;
const TITLE_LEN: usize = 80;
const MODEL_LINE_LEN: usize = 36;
const HEADER_LINE_LEN: usize = 168;

/// Per-file header attributes, fixed once scanning starts.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub endian: Endian,
    /// Format identifier, e.g. "CTM bin 02".
    pub filetype: String,
    pub title: String,
    /// Model name from the first block's model line, e.g. "GEOS5".
    pub model_name: String,
    /// Declared horizontal resolution (lon, lat) in degrees.
    pub resolution: (f64, f64),
    pub halfpolar: bool,
    pub center180: bool,
}

/// One data block as discovered on disk, catalog-unresolved.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableBlock {
    pub category: String,
    pub tracer_number: i32,
    pub unit: String,
    /// Validity window start, hours since the tau epoch.
    pub tau0: f64,
    /// Validity window end, hours since the tau epoch.
    pub tau1: f64,
    pub dims: (usize, usize, usize),
    /// 1-indexed origin of this block inside the model grid.
    pub origin: (usize, usize, usize),
    /// File position of the first payload byte.
    pub byte_offset: u64,
    /// Payload length in bytes.
    pub byte_size: u64,
}

/// Model-line fields, parsed once for the header and size-checked thereafter.
struct ModelLine {
    name: String,
    resolution: (f64, f64),
    halfpolar: bool,
    center180: bool,
}

/// Lazy block iterator over one open file.
///
/// Restartable only by reopening the file; offsets emitted by a walk are
/// valid only against the complete, consistent walk that produced them.
pub struct Scanner {
    reader: RecordReader,
    header: FileHeader,
    first_block_pending: bool,
    done: bool,
}

impl Scanner {
    /// Open a file, read its header records and position the scanner on the
    /// first block.
    pub fn open(path: &Path) -> BpchResult<Self> {
        let mut reader = RecordReader::open(path)?;

        let filetype_rec = reader
            .next_record()?
            .ok_or_else(|| reader.corrupt("missing filetype record"))?;
        if filetype_rec.len() != FILETYPE_LEN {
            return Err(reader.corrupt(format!(
                "filetype record is {} bytes, expected {}",
                filetype_rec.len(),
                FILETYPE_LEN
            )));
        }
        let filetype = fixed_str(&filetype_rec);

        let title_rec = reader
            .next_record()?
            .ok_or_else(|| reader.corrupt("missing title record"))?;
        if title_rec.len() != TITLE_LEN {
            return Err(reader.corrupt(format!(
                "title record is {} bytes, expected {}",
                title_rec.len(),
                TITLE_LEN
            )));
        }
        let title = fixed_str(&title_rec);

        // The first model line doubles as the file's grid declaration.
        let model_rec = reader
            .next_record()?
            .ok_or_else(|| reader.corrupt("file contains no data blocks"))?;
        let model = parse_model_line(&reader, &model_rec)?;

        debug!(
            path = %path.display(),
            filetype = %filetype,
            model = %model.name,
            "opened bpch file"
        );

        let header = FileHeader {
            endian: reader.endian(),
            filetype,
            title,
            model_name: model.name,
            resolution: model.resolution,
            halfpolar: model.halfpolar,
            center180: model.center180,
        };

        Ok(Self {
            reader,
            header,
            first_block_pending: true,
            done: false,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        self.reader.path()
    }

    fn next_block(&mut self) -> BpchResult<Option<VariableBlock>> {
        // Each block is preceded by a model line; the first one was consumed
        // while building the header.
        if self.first_block_pending {
            self.first_block_pending = false;
        } else {
            let Some(model_rec) = self.reader.next_record()? else {
                return Ok(None);
            };
            if model_rec.len() != MODEL_LINE_LEN {
                return Err(self.reader.corrupt(format!(
                    "model line is {} bytes, expected {}",
                    model_rec.len(),
                    MODEL_LINE_LEN
                )));
            }
        }

        let header_rec = self
            .reader
            .next_record()?
            .ok_or_else(|| self.reader.corrupt("unexpected end of file before block header"))?;
        if header_rec.len() != HEADER_LINE_LEN {
            return Err(self.reader.corrupt(format!(
                "block header is {} bytes, expected {}",
                header_rec.len(),
                HEADER_LINE_LEN
            )));
        }

        let endian = self.reader.endian();
        let category = fixed_str(&header_rec[0..40]);
        let tracer_number = endian.read_i32(slice4(&header_rec, 40));
        let unit = fixed_str(&header_rec[44..84]);
        let tau0 = endian.read_f64(slice8(&header_rec, 84));
        let tau1 = endian.read_f64(slice8(&header_rec, 92));
        // 40 reserved bytes at 100..140
        let nx = endian.read_i32(slice4(&header_rec, 140));
        let ny = endian.read_i32(slice4(&header_rec, 144));
        let nz = endian.read_i32(slice4(&header_rec, 148));
        let i0 = endian.read_i32(slice4(&header_rec, 152));
        let j0 = endian.read_i32(slice4(&header_rec, 156));
        let l0 = endian.read_i32(slice4(&header_rec, 160));

        if nx <= 0 || ny <= 0 || nz <= 0 {
            return Err(self
                .reader
                .corrupt(format!("non-positive dimensions ({}, {}, {})", nx, ny, nz)));
        }
        let dims = (nx as usize, ny as usize, nz as usize);

        if i0 <= 0 || j0 <= 0 || l0 <= 0 {
            return Err(self
                .reader
                .corrupt(format!("non-positive grid origin ({}, {}, {})", i0, j0, l0)));
        }

        let Some((byte_offset, byte_size)) = self.reader.skip_record()? else {
            return Err(self.reader.corrupt("unexpected end of file before block payload"));
        };

        let expected = (dims.0 * dims.1 * dims.2 * 4) as u64;
        if byte_size != expected {
            return Err(self.reader.corrupt(format!(
                "payload is {} bytes but dims ({}, {}, {}) require {}",
                byte_size, dims.0, dims.1, dims.2, expected
            )));
        }

        Ok(Some(VariableBlock {
            category,
            tracer_number,
            unit,
            tau0,
            tau1,
            dims,
            origin: (i0 as usize, j0 as usize, l0 as usize),
            byte_offset,
            byte_size,
        }))
    }
}

impl Iterator for Scanner {
    type Item = BpchResult<VariableBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                // fail fast, nothing after a framing error is trustworthy
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn parse_model_line(reader: &RecordReader, rec: &[u8]) -> BpchResult<ModelLine> {
    if rec.len() != MODEL_LINE_LEN {
        return Err(reader.corrupt(format!(
            "model line is {} bytes, expected {}",
            rec.len(),
            MODEL_LINE_LEN
        )));
    }
    let endian = reader.endian();
    Ok(ModelLine {
        name: fixed_str(&rec[0..20]),
        resolution: (
            f64::from(endian.read_f32(slice4(rec, 20))),
            f64::from(endian.read_f32(slice4(rec, 24))),
        ),
        halfpolar: endian.read_i32(slice4(rec, 28)) != 0,
        center180: endian.read_i32(slice4(rec, 32)) != 0,
    })
}

/// Decode a space-padded fixed-width string field.
fn fixed_str(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

fn slice4(bytes: &[u8], at: usize) -> [u8; 4] {
    bytes[at..at + 4].try_into().unwrap()
}

fn slice8(bytes: &[u8], at: usize) -> [u8; 8] {
    bytes[at..at + 8].try_into().unwrap()
}
