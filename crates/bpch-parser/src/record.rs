//! Fortran unformatted record framing.
//!
//! Every record in a bpch file is bracketed by a 4-byte byte count written
//! before and after the payload. The two counts must agree; a mismatch means
//! the walk has lost sync and the file is unusable from that point on, so
//! framing errors are always fatal for the file.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bpch_common::{BpchError, BpchResult, Endian};

/// Record lengths considered plausible for the leading file header record
/// when probing byte order.
const PROBE_MAX: u32 = 4096;

/// Sequential reader over framed records.
///
/// Forward-only after construction. The byte-order probe at open time is the
/// only backward seek; from then on the cursor moves strictly ahead, which is
/// what makes recorded payload offsets valid for later random access.
pub(crate) struct RecordReader {
    path: PathBuf,
    file: BufReader<File>,
    endian: Endian,
    pos: u64,
}

impl RecordReader {
    /// Open a file and detect its byte order from the first length marker.
    pub fn open(path: &Path) -> BpchResult<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut probe = [0u8; 4];
        reader.read_exact(&mut probe).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                BpchError::CorruptRecord {
                    path: path.to_path_buf(),
                    offset: 0,
                    detail: "file too short for a record marker".to_string(),
                }
            } else {
                BpchError::Io(e)
            }
        })?;

        let be = u32::from_be_bytes(probe);
        let le = u32::from_le_bytes(probe);
        let endian = if (1..=PROBE_MAX).contains(&be) {
            Endian::Big
        } else if (1..=PROBE_MAX).contains(&le) {
            Endian::Little
        } else {
            return Err(BpchError::CorruptRecord {
                path: path.to_path_buf(),
                offset: 0,
                detail: format!("unrecognizable leading record marker {:02x?}", probe),
            });
        };

        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: reader,
            endian,
            pos: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Current byte position in the file.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Read the next record's payload. `None` at a record-aligned EOF.
    pub fn next_record(&mut self) -> BpchResult<Option<Vec<u8>>> {
        let Some(len) = self.read_marker()? else {
            return Ok(None);
        };

        let mut payload = vec![0u8; len as usize];
        self.file
            .read_exact(&mut payload)
            .map_err(|e| self.map_read_err(e))?;
        self.pos += u64::from(len);

        self.check_suffix(len)?;
        Ok(Some(payload))
    }

    /// Skip the next record's payload without materializing it.
    ///
    /// Returns `(payload_offset, payload_len)`, or `None` at a
    /// record-aligned EOF.
    pub fn skip_record(&mut self) -> BpchResult<Option<(u64, u64)>> {
        let Some(len) = self.read_marker()? else {
            return Ok(None);
        };

        let offset = self.pos;
        self.file.seek_relative(i64::from(len))?;
        self.pos += u64::from(len);

        self.check_suffix(len)?;
        Ok(Some((offset, u64::from(len))))
    }

    fn check_suffix(&mut self, len: u32) -> BpchResult<()> {
        let suffix_at = self.pos;
        let suffix = self.read_marker()?.ok_or_else(|| BpchError::CorruptRecord {
            path: self.path.clone(),
            offset: suffix_at,
            detail: "unexpected end of file in record suffix".to_string(),
        })?;
        if suffix != len {
            return Err(BpchError::CorruptRecord {
                path: self.path.clone(),
                offset: suffix_at,
                detail: format!("length prefix {} does not match suffix {}", len, suffix),
            });
        }
        Ok(())
    }

    /// Read one 4-byte length marker. `None` when the file ends exactly
    /// before the marker.
    fn read_marker(&mut self) -> BpchResult<Option<u32>> {
        let mut buf = [0u8; 4];
        let n = self.file.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        if n < 4 {
            self.file
                .read_exact(&mut buf[n..])
                .map_err(|e| self.map_read_err(e))?;
        }
        self.pos += 4;
        Ok(Some(self.endian.read_u32(buf)))
    }

    fn map_read_err(&self, e: io::Error) -> BpchError {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            BpchError::CorruptRecord {
                path: self.path.clone(),
                offset: self.pos,
                detail: "unexpected end of file inside a record".to_string(),
            }
        } else {
            BpchError::Io(e)
        }
    }

    /// Build a framing error at the current position.
    pub fn corrupt(&self, detail: impl Into<String>) -> BpchError {
        BpchError::CorruptRecord {
            path: self.path.clone(),
            offset: self.pos,
            detail: detail.into(),
        }
    }
}
