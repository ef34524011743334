//! Synthetic bpch file builder.
//!
//! Emits byte-exact Fortran unformatted records so parser tests can work
//! against real on-disk layout without shipping binary fixtures. `build`
//! returns the raw bytes so a test can also corrupt them deliberately.

use std::fs;
use std::io;
use std::path::Path;

use bpch_common::Endian;

/// One data block to be written.
#[derive(Debug, Clone)]
pub struct BlockSpec {
    pub category: String,
    pub tracer: i32,
    pub unit: String,
    pub tau0: f64,
    pub tau1: f64,
    pub dims: (usize, usize, usize),
    /// 1-indexed grid origin, as GEOS-Chem writes it.
    pub origin: (i32, i32, i32),
    pub data: Vec<f32>,
}

impl BlockSpec {
    /// A block with the given identity and a zero-filled payload.
    pub fn new(category: &str, tracer: i32, dims: (usize, usize, usize)) -> Self {
        Self {
            category: category.to_string(),
            tracer,
            unit: "ppbv".to_string(),
            tau0: 0.0,
            tau1: 24.0,
            dims,
            origin: (1, 1, 1),
            data: vec![0.0; dims.0 * dims.1 * dims.2],
        }
    }

    pub fn unit(mut self, unit: &str) -> Self {
        self.unit = unit.to_string();
        self
    }

    pub fn taus(mut self, tau0: f64, tau1: f64) -> Self {
        self.tau0 = tau0;
        self.tau1 = tau1;
        self
    }

    pub fn origin(mut self, origin: (i32, i32, i32)) -> Self {
        self.origin = origin;
        self
    }

    pub fn data(mut self, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), self.dims.0 * self.dims.1 * self.dims.2);
        self.data = data;
        self
    }
}

/// Builder for complete synthetic bpch files.
#[derive(Debug, Clone)]
pub struct BpchBuilder {
    endian: Endian,
    filetype: String,
    title: String,
    model_name: String,
    resolution: (f32, f32),
    halfpolar: i32,
    center180: i32,
    blocks: Vec<BlockSpec>,
}

impl Default for BpchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BpchBuilder {
    pub fn new() -> Self {
        Self {
            endian: Endian::Big,
            filetype: "CTM bin 02".to_string(),
            title: "Synthetic CTM output".to_string(),
            model_name: "GEOS5".to_string(),
            resolution: (5.0, 4.0),
            halfpolar: 1,
            center180: 1,
            blocks: Vec::new(),
        }
    }

    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn filetype(mut self, filetype: &str) -> Self {
        self.filetype = filetype.to_string();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn model(mut self, name: &str, resolution: (f32, f32)) -> Self {
        self.model_name = name.to_string();
        self.resolution = resolution;
        self
    }

    pub fn halfpolar(mut self, halfpolar: i32) -> Self {
        self.halfpolar = halfpolar;
        self
    }

    pub fn center180(mut self, center180: i32) -> Self {
        self.center180 = center180;
        self
    }

    pub fn block(mut self, block: BlockSpec) -> Self {
        self.blocks.push(block);
        self
    }

    /// Assemble the file as raw bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();

        self.write_record(&mut out, padded(&self.filetype, 40).as_slice());
        self.write_record(&mut out, padded(&self.title, 80).as_slice());

        for block in &self.blocks {
            let mut model_line = Vec::with_capacity(36);
            model_line.extend_from_slice(&padded(&self.model_name, 20));
            model_line.extend_from_slice(&self.endian.f32_bytes(self.resolution.0));
            model_line.extend_from_slice(&self.endian.f32_bytes(self.resolution.1));
            model_line.extend_from_slice(&self.endian.i32_bytes(self.halfpolar));
            model_line.extend_from_slice(&self.endian.i32_bytes(self.center180));
            self.write_record(&mut out, &model_line);

            let payload_len = block.data.len() * 4;

            let mut header_line = Vec::with_capacity(168);
            header_line.extend_from_slice(&padded(&block.category, 40));
            header_line.extend_from_slice(&self.endian.i32_bytes(block.tracer));
            header_line.extend_from_slice(&padded(&block.unit, 40));
            header_line.extend_from_slice(&self.endian.f64_bytes(block.tau0));
            header_line.extend_from_slice(&self.endian.f64_bytes(block.tau1));
            header_line.extend_from_slice(&padded("", 40));
            header_line.extend_from_slice(&self.endian.i32_bytes(block.dims.0 as i32));
            header_line.extend_from_slice(&self.endian.i32_bytes(block.dims.1 as i32));
            header_line.extend_from_slice(&self.endian.i32_bytes(block.dims.2 as i32));
            header_line.extend_from_slice(&self.endian.i32_bytes(block.origin.0));
            header_line.extend_from_slice(&self.endian.i32_bytes(block.origin.1));
            header_line.extend_from_slice(&self.endian.i32_bytes(block.origin.2));
            header_line.extend_from_slice(&self.endian.i32_bytes(payload_len as i32 + 8));
            self.write_record(&mut out, &header_line);

            let mut payload = Vec::with_capacity(payload_len);
            for v in &block.data {
                payload.extend_from_slice(&self.endian.f32_bytes(*v));
            }
            self.write_record(&mut out, &payload);
        }

        out
    }

    /// Assemble and write to a path.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.build())
    }

    /// Assemble into a fresh temp file; the handle keeps it alive.
    pub fn to_temp_file(&self) -> io::Result<tempfile::NamedTempFile> {
        let mut f = tempfile::NamedTempFile::new()?;
        io::Write::write_all(&mut f, &self.build())?;
        io::Write::flush(&mut f)?;
        Ok(f)
    }

    fn write_record(&self, out: &mut Vec<u8>, payload: &[u8]) {
        let marker = self.endian.u32_bytes(payload.len() as u32);
        out.extend_from_slice(&marker);
        out.extend_from_slice(payload);
        out.extend_from_slice(&marker);
    }
}

fn padded(s: &str, width: usize) -> Vec<u8> {
    let mut bytes = s.as_bytes().to_vec();
    assert!(bytes.len() <= width, "field '{}' exceeds {} bytes", s, width);
    bytes.resize(width, b' ');
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_framing() {
        let file = BpchBuilder::new().build();
        // filetype record: 4-byte prefix, 40-byte payload, 4-byte suffix
        assert_eq!(&file[0..4], &40u32.to_be_bytes());
        assert_eq!(&file[4..14], b"CTM bin 02");
        assert_eq!(&file[44..48], &40u32.to_be_bytes());
        // title record follows immediately
        assert_eq!(&file[48..52], &80u32.to_be_bytes());
        assert_eq!(file.len(), 48 + 88);
    }

    #[test]
    fn test_block_sizes() {
        let file = BpchBuilder::new()
            .block(BlockSpec::new("IJ-AVG-$", 2, (2, 2, 1)))
            .build();
        // header records (48 + 88) + model line (36 + 8) + header line
        // (168 + 8) + payload (16 + 8)
        assert_eq!(file.len(), 136 + 44 + 176 + 24);
    }

    #[test]
    fn test_little_endian_markers() {
        let file = BpchBuilder::new().endian(Endian::Little).build();
        assert_eq!(&file[0..4], &40u32.to_le_bytes());
    }
}
