//! Static grid registry for GEOS-Chem model configurations.
//!
//! bpch files name their grid indirectly: the header carries a model name
//! and a horizontal resolution, and everything else (grid extents, vertical
//! level definitions) comes from this hard-coded table of known
//! GEOS-Chem-era configurations. A mismatch is a hard error; nothing is
//! inferred from file content.
//!
//! Vertical definitions are either pure-sigma edge tables or hybrid
//! sigma-pressure Ap/Bp parameter tables; hybrid eta edges are evaluated at
//! the standard surface pressure.

use serde::{Deserialize, Serialize};

use crate::error::{BpchError, BpchResult};

/// Average surface pressure used to evaluate hybrid levels [hPa].
const P_SURF: f64 = 1013.25;
/// Pressure at model top [hPa].
const P_TOP: f64 = 0.01;

/// Horizontal resolutions (lon, lat) accepted by the registry [degrees].
const KNOWN_RESOLUTIONS: [(f64, f64); 6] = [
    (5.0, 4.0),
    (2.5, 2.0),
    (1.25, 1.0),
    (1.0, 1.0),
    (0.666_666_666_666_666_6, 0.5),
    (0.312_5, 0.25),
];

/// Spatial grid definition for one model/resolution combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Canonical model name (e.g. "GEOS5").
    pub model_name: String,
    /// Horizontal resolution (lon, lat) in degrees.
    pub resolution: (f64, f64),
    /// Number of longitude cells.
    pub lon_count: usize,
    /// Number of latitude cells.
    pub lat_count: usize,
    /// Vertical level edges, surface to top (sigma or eta, unitless).
    /// Empty for 2-D-only configurations.
    pub level_edges: Vec<f64>,
    /// Polar grid boxes span half the latitude of interior boxes.
    pub halfpolar: bool,
    /// Longitude grid centered on 180 degrees.
    pub center180: bool,
}

impl GridSpec {
    /// Number of vertical layers (edges minus one; 0 for 2-D grids).
    pub fn layer_count(&self) -> usize {
        self.level_edges.len().saturating_sub(1)
    }

    /// Vertical level centers, the midpoint of adjacent edges.
    pub fn level_centers(&self) -> Vec<f64> {
        self.level_edges
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]))
            .collect()
    }

    /// Longitude cell edges, west to east.
    pub fn lon_edges(&self) -> Vec<f64> {
        let (rlon, _) = self.resolution;
        let shift = if self.center180 { rlon / 2.0 } else { 0.0 };
        (0..=self.lon_count)
            .map(|i| i as f64 * rlon - 180.0 - shift)
            .collect()
    }

    /// Longitude cell centers.
    pub fn lon_centers(&self) -> Vec<f64> {
        let (rlon, _) = self.resolution;
        self.lon_edges()
            .iter()
            .take(self.lon_count)
            .map(|e| e + rlon / 2.0)
            .collect()
    }

    /// Latitude cell edges, south to north. The first and last edges are
    /// clamped to the poles.
    pub fn lat_edges(&self) -> Vec<f64> {
        let (_, rlat) = self.resolution;
        let shift = if self.halfpolar { rlat / 2.0 } else { 0.0 };
        let mut edges: Vec<f64> = (0..=self.lat_count)
            .map(|j| j as f64 * rlat - 90.0 - shift)
            .collect();
        if let Some(first) = edges.first_mut() {
            *first = -90.0;
        }
        if let Some(last) = edges.last_mut() {
            *last = 90.0;
        }
        edges
    }

    /// Latitude cell centers; polar centers sit mid-box when halfpolar.
    pub fn lat_centers(&self) -> Vec<f64> {
        let (_, rlat) = self.resolution;
        let edges = self.lat_edges();
        let mut centers: Vec<f64> = (0..self.lat_count).map(|j| j as f64 * rlat - 90.0).collect();
        if self.halfpolar {
            centers[0] = (edges[0] + edges[1]) / 2.0;
            let n = centers.len();
            centers[n - 1] = -centers[0];
        } else {
            for c in centers.iter_mut() {
                *c += rlat / 2.0;
            }
        }
        centers
    }
}

/// Look up the grid definition for a model name and resolution.
///
/// Model names tolerate separator variations ("GEOS5", "GEOS-5", "GEOS_5").
/// `halfpolar`/`center180` come from the file header, not the table, since
/// nested-grid output overrides them per file.
pub fn resolve_grid(
    model_name: &str,
    resolution: (f64, f64),
    halfpolar: bool,
    center180: bool,
) -> BpchResult<GridSpec> {
    let canonical = canonical_model(model_name).ok_or_else(|| BpchError::UnknownGrid {
        model: model_name.to_string(),
        resolution,
    })?;

    let (rlon, rlat) = KNOWN_RESOLUTIONS
        .iter()
        .copied()
        .find(|(lon, lat)| (lon - resolution.0).abs() < 1e-3 && (lat - resolution.1).abs() < 1e-3)
        .ok_or_else(|| BpchError::UnknownGrid {
            model: model_name.to_string(),
            resolution,
        })?;

    let lon_count = (360.0 / rlon).round() as usize;
    let lat_count = (180.0 / rlat).round() as usize + usize::from(halfpolar);

    let level_edges = match model_vertical(canonical) {
        VerticalDef::Sigma(esig) => esig.to_vec(),
        VerticalDef::Hybrid { ap, bp } => ap
            .iter()
            .zip(bp.iter())
            .map(|(a, b)| (a + b * P_SURF - P_TOP) / (P_SURF - P_TOP))
            .collect(),
        VerticalDef::None => Vec::new(),
    };

    Ok(GridSpec {
        model_name: canonical.to_string(),
        resolution: (rlon, rlat),
        lon_count,
        lat_count,
        level_edges,
        halfpolar,
        center180,
    })
}

/// Canonicalize a model name, accepting '-', '_' and space as separators.
fn canonical_model(name: &str) -> Option<&'static str> {
    let squashed: String = name
        .trim()
        .to_ascii_uppercase()
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' ' | '.'))
        .collect();

    let canonical = match squashed.as_str() {
        "GENERIC" => "GENERIC",
        "GEOS1" => "GEOS1",
        "GEOSSTRAT" => "GEOS_STRAT",
        "GEOS3" => "GEOS3",
        "GEOS330L" | "GEOS3REDUCED" => "GEOS3_30L",
        "GEOS4" | "FVDAS" => "GEOS4",
        "GEOS430L" | "GEOS4REDUCED" => "GEOS4_30L",
        "GEOS5" | "GEOS5NATIVE" | "GEOS57" | "GEOS57NATIVE" | "GEOSFP" | "GEOSFPNATIVE"
        | "MERRA" | "MERRANATIVE" | "MERRA2" => "GEOS5",
        "GEOS547L" | "GEOS5REDUCED" | "GEOS5747L" | "GEOS57REDUCED" | "GEOSFP47L"
        | "GEOSFPREDUCED" | "MERRA47L" | "MERRAREDUCED" | "MERRA247L" => "GEOS5_47L",
        _ => return None,
    };
    Some(canonical)
}

enum VerticalDef {
    Sigma(&'static [f64]),
    Hybrid {
        ap: &'static [f64],
        bp: &'static [f64],
    },
    None,
}

fn model_vertical(canonical: &str) -> VerticalDef {
    match canonical {
        "GEOS1" => VerticalDef::Sigma(&ESIG_GEOS1),
        "GEOS_STRAT" => VerticalDef::Sigma(&ESIG_GEOS_STRAT),
        "GEOS3" => VerticalDef::Sigma(&ESIG_GEOS3),
        "GEOS3_30L" => VerticalDef::Sigma(&ESIG_GEOS3_30L),
        "GEOS4" => VerticalDef::Hybrid {
            ap: &AP_GEOS4,
            bp: &BP_GEOS4,
        },
        "GEOS4_30L" => VerticalDef::Hybrid {
            ap: &AP_GEOS4_30L,
            bp: &BP_GEOS4_30L,
        },
        "GEOS5" => VerticalDef::Hybrid {
            ap: &AP_GEOS5,
            bp: &BP_GEOS5,
        },
        "GEOS5_47L" => VerticalDef::Hybrid {
            ap: &AP_GEOS5_47L,
            bp: &BP_GEOS5_47L,
        },
        _ => VerticalDef::None,
    }
}

// Sigma edges for the pure-sigma models, surface to top.

const ESIG_GEOS1: [f64; 21] = [
    1.000000, 0.987871, 0.954730, 0.905120, 0.843153, 0.772512, 0.696448, 0.617779, 0.539000,
    0.462000, 0.387500, 0.316500, 0.251000, 0.194500, 0.149800, 0.114600, 0.085500, 0.060500,
    0.039000, 0.019000, 0.000000,
];

const ESIG_GEOS_STRAT: [f64; 27] = [
    1.000000, 0.987871, 0.954730, 0.905120, 0.845000, 0.780000, 0.710000, 0.639000, 0.570000,
    0.503000, 0.440000, 0.380000, 0.325000, 0.278000, 0.237954, 0.202593, 0.171495, 0.144267,
    0.121347, 0.102098, 0.085972, 0.072493, 0.061252, 0.051896, 0.037692, 0.019958, 0.000000,
];

const ESIG_GEOS3: [f64; 49] = [
    1.000000, 0.997095, 0.991200, 0.981500, 0.967100, 0.946800, 0.919500, 0.884000, 0.839000,
    0.783000, 0.718200, 0.647600, 0.574100, 0.500000, 0.427800, 0.359500, 0.297050, 0.241950,
    0.194640, 0.155000, 0.122680, 0.096900, 0.076480, 0.060350, 0.047610, 0.037540, 0.029600,
    0.023330, 0.018380, 0.014480, 0.011405, 0.008975, 0.007040, 0.005500, 0.004280, 0.003300,
    0.002530, 0.001900, 0.001440, 0.001060, 0.000765, 0.000540, 0.000370, 0.000245, 0.000155,
    0.000092, 0.0000475, 0.0000177, 0.000000,
];

const ESIG_GEOS3_30L: [f64; 31] = [
    1.000000, 0.997095, 0.991200, 0.981500, 0.967100, 0.946800, 0.919500, 0.884000, 0.839000,
    0.783000, 0.718200, 0.647600, 0.574100, 0.500000, 0.427800, 0.359500, 0.297050, 0.241950,
    0.194640, 0.155000, 0.122680, 0.096900, 0.076480, 0.047610, 0.029600, 0.018380, 0.007040,
    0.002530, 0.000765, 0.000155, 0.000000,
];

// Hybrid Ap [hPa] / Bp [unitless] parameter tables.

const AP_GEOS4: [f64; 56] = [
    0.000000, 0.000000, 12.704939, 35.465965, 66.098427, 101.671654, 138.744400, 173.403183,
    198.737839, 215.417526, 223.884689, 224.362869, 216.864929, 201.192093, 176.929993,
    150.393005, 127.837006, 108.663429, 92.365662, 78.512299, 66.603378, 56.387939, 47.643932,
    40.175419, 33.809956, 28.367815, 23.730362, 19.791553, 16.457071, 13.643393, 11.276889,
    9.292943, 7.619839, 6.216800, 5.046805, 4.076567, 3.276433, 2.620212, 2.084972, 1.650792,
    1.300508, 1.019442, 0.795134, 0.616779, 0.475806, 0.365041, 0.278526, 0.211349, 0.159495,
    0.119703, 0.089345, 0.066000, 0.047585, 0.032700, 0.020000, 0.010000,
];

const BP_GEOS4: [f64; 56] = [
    1.000000, 0.985110, 0.943290, 0.867830, 0.764920, 0.642710, 0.510460, 0.378440, 0.270330,
    0.183300, 0.115030, 0.063720, 0.028010, 0.006960, 0.000000, 0.000000, 0.000000, 0.000000,
    0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000,
    0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000,
    0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000,
    0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000,
    0.000000, 0.000000,
];

const AP_GEOS4_30L: [f64; 31] = [
    0.000000, 0.000000, 12.704939, 35.465965, 66.098427, 101.671654, 138.744400, 173.403183,
    198.737839, 215.417526, 223.884689, 224.362869, 216.864929, 201.192093, 176.929993,
    150.393005, 127.837006, 108.663429, 92.365662, 78.512299, 56.387939, 40.175419, 28.367815,
    19.791553, 9.292943, 4.076567, 1.650792, 0.616779, 0.211349, 0.066000, 0.010000,
];

const BP_GEOS4_30L: [f64; 31] = [
    1.000000, 0.985110, 0.943290, 0.867830, 0.764920, 0.642710, 0.510460, 0.378440, 0.270330,
    0.183300, 0.115030, 0.063720, 0.028010, 0.006960, 0.000000, 0.000000, 0.000000, 0.000000,
    0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000, 0.000000,
    0.000000, 0.000000, 0.000000, 0.000000,
];

const AP_GEOS5: [f64; 73] = [
    0.000000e+00, 4.804826e-02, 6.593752e+00, 1.313480e+01, 1.961311e+01, 2.609201e+01,
    3.257081e+01, 3.898201e+01, 4.533901e+01, 5.169611e+01, 5.805321e+01, 6.436264e+01,
    7.062198e+01, 7.883422e+01, 8.909992e+01, 9.936521e+01, 1.091817e+02, 1.189586e+02,
    1.286959e+02, 1.429100e+02, 1.562600e+02, 1.696090e+02, 1.816190e+02, 1.930970e+02,
    2.032590e+02, 2.121500e+02, 2.187760e+02, 2.238980e+02, 2.243630e+02, 2.168650e+02,
    2.011920e+02, 1.769300e+02, 1.503930e+02, 1.278370e+02, 1.086630e+02, 9.236572e+01,
    7.851231e+01, 6.660341e+01, 5.638791e+01, 4.764391e+01, 4.017541e+01, 3.381001e+01,
    2.836781e+01, 2.373041e+01, 1.979160e+01, 1.645710e+01, 1.364340e+01, 1.127690e+01,
    9.292942e+00, 7.619842e+00, 6.216801e+00, 5.046801e+00, 4.076571e+00, 3.276431e+00,
    2.620211e+00, 2.084970e+00, 1.650790e+00, 1.300510e+00, 1.019440e+00, 7.951341e-01,
    6.167791e-01, 4.758061e-01, 3.650411e-01, 2.785261e-01, 2.113490e-01, 1.594950e-01,
    1.197030e-01, 8.934502e-02, 6.600001e-02, 4.758501e-02, 3.270000e-02, 2.000000e-02,
    1.000000e-02,
];

const BP_GEOS5: [f64; 73] = [
    1.000000e+00, 9.849520e-01, 9.634060e-01, 9.418650e-01, 9.203870e-01, 8.989080e-01,
    8.774290e-01, 8.560180e-01, 8.346609e-01, 8.133039e-01, 7.919469e-01, 7.706375e-01,
    7.493782e-01, 7.211660e-01, 6.858999e-01, 6.506349e-01, 6.158184e-01, 5.810415e-01,
    5.463042e-01, 4.945902e-01, 4.437402e-01, 3.928911e-01, 3.433811e-01, 2.944031e-01,
    2.467411e-01, 2.003501e-01, 1.562241e-01, 1.136021e-01, 6.372006e-02, 2.801004e-02,
    6.960025e-03, 8.175413e-09, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00,
    0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00,
    0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00,
    0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00,
    0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00,
    0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00,
    0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00,
    0.000000e+00,
];

const AP_GEOS5_47L: [f64; 48] = [
    0.000000e+00, 4.804826e-02, 6.593752e+00, 1.313480e+01, 1.961311e+01, 2.609201e+01,
    3.257081e+01, 3.898201e+01, 4.533901e+01, 5.169611e+01, 5.805321e+01, 6.436264e+01,
    7.062198e+01, 7.883422e+01, 8.909992e+01, 9.936521e+01, 1.091817e+02, 1.189586e+02,
    1.286959e+02, 1.429100e+02, 1.562600e+02, 1.696090e+02, 1.816190e+02, 1.930970e+02,
    2.032590e+02, 2.121500e+02, 2.187760e+02, 2.238980e+02, 2.243630e+02, 2.168650e+02,
    2.011920e+02, 1.769300e+02, 1.503930e+02, 1.278370e+02, 1.086630e+02, 9.236572e+01,
    7.851231e+01, 5.638791e+01, 4.017541e+01, 2.836781e+01, 1.979160e+01, 9.292942e+00,
    4.076571e+00, 1.650790e+00, 6.167791e-01, 2.113490e-01, 6.600001e-02, 1.000000e-02,
];

const BP_GEOS5_47L: [f64; 48] = [
    1.000000e+00, 9.849520e-01, 9.634060e-01, 9.418650e-01, 9.203870e-01, 8.989080e-01,
    8.774290e-01, 8.560180e-01, 8.346609e-01, 8.133039e-01, 7.919469e-01, 7.706375e-01,
    7.493782e-01, 7.211660e-01, 6.858999e-01, 6.506349e-01, 6.158184e-01, 5.810415e-01,
    5.463042e-01, 4.945902e-01, 4.437402e-01, 3.928911e-01, 3.433811e-01, 2.944031e-01,
    2.467411e-01, 2.003501e-01, 1.562241e-01, 1.136021e-01, 6.372006e-02, 2.801004e-02,
    6.960025e-03, 8.175413e-09, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00,
    0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00,
    0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00, 0.000000e+00,
];
