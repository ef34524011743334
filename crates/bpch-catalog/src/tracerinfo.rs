//! `tracerinfo.dat` parsing.
//!
//! Fixed-width layout (byte columns):
//!
//! ```text
//! name      0..8
//! (spacer)  8..9
//! full_name 9..39
//! molwt     39..49   kg/mole
//! C         49..52   moles carbon per mole tracer
//! tracer    52..61   tracer number
//! scale     61..71   standard scale factor
//! (spacer)  71..72
//! unit      72..112
//! ```
//!
//! Lines starting with `#` are comments.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bpch_common::BpchResult;

use crate::{column, CatalogIssue};

/// Molecular weight of carbon atoms [kg/mole], substituted for hydrocarbon
/// tracers whose catalog weight describes the carbon basis.
pub const C_MOLECULAR_WEIGHT: f64 = 12e-3;

/// One resolved tracer identity from tracerinfo.dat.
#[derive(Debug, Clone, PartialEq)]
pub struct TracerDefinition {
    pub tracer_number: u32,
    pub name: String,
    pub full_name: String,
    pub unit: String,
    /// Multiplicative factor applied to raw stored values.
    pub scale_factor: f64,
    /// kg/mole; `None` when the catalog lists no weight (zero column).
    pub molecular_weight: Option<f64>,
    /// Carbon-counted tracer (`C` column != 1).
    pub hydrocarbon: bool,
}

pub(crate) fn load(
    path: &Path,
    issues: &mut Vec<CatalogIssue>,
) -> BpchResult<HashMap<u32, TracerDefinition>> {
    let text = fs::read_to_string(path)?;
    let mut tracers = HashMap::new();

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Ok(def) => {
                if tracers.contains_key(&def.tracer_number) {
                    issues.push(CatalogIssue {
                        file: path.to_path_buf(),
                        line: lineno,
                        detail: format!("duplicate tracer number {}", def.tracer_number),
                    });
                } else {
                    tracers.insert(def.tracer_number, def);
                }
            }
            Err(detail) => issues.push(CatalogIssue {
                file: path.to_path_buf(),
                line: lineno,
                detail,
            }),
        }
    }

    Ok(tracers)
}

fn parse_line(line: &str) -> Result<TracerDefinition, String> {
    let name = column(line, 0, 8).ok_or("name column is not valid text")?;
    if name.is_empty() {
        return Err("empty tracer name".to_string());
    }
    let full_name = column(line, 9, 39).ok_or("full_name column is not valid text")?;

    let molwt: f64 = parse_num(line, 39, 49, "molwt")?;
    let carbon: i64 = parse_num(line, 49, 52, "C")?;
    let number: i64 = parse_num(line, 52, 61, "tracer")?;
    let scale: f64 = parse_num(line, 61, 71, "scale")?;
    let unit = column(line, 72, 112).unwrap_or("");

    if number < 0 {
        return Err(format!("negative tracer number {}", number));
    }

    let hydrocarbon = carbon != 1;
    let molecular_weight = if hydrocarbon {
        Some(C_MOLECULAR_WEIGHT)
    } else if molwt == 0.0 {
        None
    } else {
        Some(molwt)
    };

    Ok(TracerDefinition {
        tracer_number: number as u32,
        name: name.to_string(),
        full_name: full_name.to_string(),
        unit: unit.to_string(),
        scale_factor: scale,
        molecular_weight,
        hydrocarbon,
    })
}

fn parse_num<T: std::str::FromStr>(
    line: &str,
    start: usize,
    end: usize,
    field: &str,
) -> Result<T, String> {
    let raw = column(line, start, end).ok_or_else(|| format!("{} column is not valid text", field))?;
    raw.parse()
        .map_err(|_| format!("non-numeric {} field '{}'", field, raw))
}
