//! Tau timestamp handling.
//!
//! bpch files mark each block's validity with `tau0`/`tau1`: floating-point
//! hours since the CTM reference epoch, 1985-01-01 00:00 UTC.

use chrono::{DateTime, TimeZone, Utc};

/// CF-style unit string for the tau time coordinate.
pub const TAU_UNIT_STR: &str = "hours since 1985-01-01 00:00:00";

/// The CTM reference epoch (1985-01-01 00:00:00 UTC).
pub fn tau_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1985, 1, 1, 0, 0, 0).unwrap()
}

/// Convert hours since the reference epoch into a UTC timestamp.
///
/// Sub-hour fractions are preserved to millisecond precision, which is finer
/// than anything GEOS-Chem actually emits.
pub fn tau_to_datetime(tau: f64) -> DateTime<Utc> {
    tau_epoch() + chrono::Duration::milliseconds((tau * 3_600_000.0) as i64)
}

/// Convert a UTC timestamp into hours since the reference epoch.
pub fn datetime_to_tau(time: DateTime<Utc>) -> f64 {
    let delta = time - tau_epoch();
    delta.num_milliseconds() as f64 / 3_600_000.0
}
