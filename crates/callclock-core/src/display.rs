//! Pure display derivations for a countdown

use callclock_api::SeverityBand;

pub use callclock_util::format_countdown;

/// Severity band for the remaining fraction of a session.
///
/// More than half left is nominal, more than a quarter is a warning, and
/// anything at or below a quarter is critical.
pub fn severity_band(remaining_seconds: u32, max_seconds: u32) -> SeverityBand {
    let remaining = u64::from(remaining_seconds);
    let max = u64::from(max_seconds);

    if remaining * 2 > max {
        SeverityBand::Nominal
    } else if remaining * 4 > max {
        SeverityBand::Warning
    } else {
        SeverityBand::Critical
    }
}

/// Remaining fraction in `[0.0, 1.0]`
pub fn progress(remaining_seconds: u32, max_seconds: u32) -> f64 {
    if max_seconds == 0 {
        return 0.0;
    }
    (f64::from(remaining_seconds) / f64::from(max_seconds)).clamp(0.0, 1.0)
}
