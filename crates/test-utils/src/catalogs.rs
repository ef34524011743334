//! Catalog fixture writers.
//!
//! Produces `tracerinfo.dat` / `diaginfo.dat` text with the exact fixed
//! column layout the loaders expect, so tests never depend on hand-aligned
//! string literals.

use std::fs;
use std::io;
use std::path::Path;

/// One formatted tracerinfo.dat line.
///
/// Columns: name 0..8, full_name 9..39, molwt 39..49, C 49..52,
/// tracer 52..61, scale 61..71, unit 72..112.
pub fn tracerinfo_line(
    name: &str,
    full_name: &str,
    molwt: f64,
    carbon: i32,
    tracer: i32,
    scale: f64,
    unit: &str,
) -> String {
    format!(
        "{:<8} {:<30}{:>10.3E}{:>3}{:>9}{:>10.3E} {:<40}",
        name, full_name, molwt, carbon, tracer, scale, unit
    )
}

/// One formatted diaginfo.dat line.
///
/// Columns: offset 0..8, name 9..49, description 49..149.
pub fn diaginfo_line(offset: u32, name: &str, description: &str) -> String {
    format!("{:>8} {:<40}{}", offset, name, description)
}

/// Write a tracerinfo.dat from `(name, full_name, molwt, carbon, tracer,
/// scale, unit)` tuples.
pub fn write_tracerinfo<P: AsRef<Path>>(
    path: P,
    entries: &[(&str, &str, f64, i32, i32, f64, &str)],
) -> io::Result<()> {
    let mut text = String::from("# tracerinfo.dat test fixture\n#\n");
    for (name, full_name, molwt, carbon, tracer, scale, unit) in entries {
        text.push_str(&tracerinfo_line(name, full_name, *molwt, *carbon, *tracer, *scale, unit));
        text.push('\n');
    }
    fs::write(path, text)
}

/// Write a diaginfo.dat from `(offset, name, description)` tuples.
pub fn write_diaginfo<P: AsRef<Path>>(
    path: P,
    entries: &[(u32, &str, &str)],
) -> io::Result<()> {
    let mut text = String::from("# diaginfo.dat test fixture\n#\n");
    for (offset, name, description) in entries {
        text.push_str(&diaginfo_line(*offset, name, description));
        text.push('\n');
    }
    fs::write(path, text)
}

/// The small standard tracer table most parser tests share.
pub fn write_default_catalogs(dir: &Path) -> io::Result<(std::path::PathBuf, std::path::PathBuf)> {
    let tracerinfo = dir.join("tracerinfo.dat");
    let diaginfo = dir.join("diaginfo.dat");
    write_tracerinfo(
        &tracerinfo,
        &[
            ("NOx", "NOx tracer", 46e-3, 1, 1, 1e-9, "ppbv"),
            ("O3", "Ozone", 48e-3, 1, 2, 1e-9, "ppbv"),
            ("ISOP", "Isoprene", 68e-3, 5, 6, 1e-9, "ppbC"),
            ("AIRDEN", "Air density", 0.0, 1, 22222, 1.0, "molec/cm3"),
            ("PSURF", "Surface pressure", 0.0, 1, 31, 1.0, "hPa"),
        ],
    )?;
    write_diaginfo(
        &diaginfo,
        &[
            (0, "IJ-AVG-$", "Tracer concentration"),
            (7100, "DRYD-FLX", "Dry deposition flux"),
            (22200, "TIME-SER", "Timeseries quantities"),
            (0, "PEDGE-$", "Pressure at level edges"),
        ],
    )?;
    Ok((tracerinfo, diaginfo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracerinfo_columns() {
        let line = tracerinfo_line("O3", "Ozone", 48e-3, 1, 2, 1e-9, "ppbv");
        assert_eq!(line[0..8].trim(), "O3");
        assert_eq!(line[9..39].trim(), "Ozone");
        assert!(line[39..49].trim().parse::<f64>().is_ok());
        assert_eq!(line[49..52].trim(), "1");
        assert_eq!(line[52..61].trim(), "2");
        assert!(line[61..71].trim().parse::<f64>().is_ok());
        assert_eq!(line[72..112].trim(), "ppbv");
    }

    #[test]
    fn test_diaginfo_columns() {
        let line = diaginfo_line(7100, "DRYD-FLX", "Dry deposition flux");
        assert_eq!(line[0..8].trim(), "7100");
        assert_eq!(line[9..49].trim(), "DRYD-FLX");
        assert_eq!(line[49..].trim(), "Dry deposition flux");
    }
}
