//! Formatting helpers shared across UIs.

use crate::types::LogKind;

/// Format a processing duration in milliseconds for display
/// (e.g., "842ms", "2.3s", "1m 12s").
pub fn format_elapsed_ms(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{:.0}ms", ms)
    } else if ms < 60_000.0 {
        format!("{:.1}s", ms / 1000.0)
    } else {
        let total_secs = (ms / 1000.0) as u64;
        format!("{}m {}s", total_secs / 60, total_secs % 60)
    }
}

/// Render an intensity score as a ten-cell meter (e.g., "▮▮▮▮▮▮▮░░░").
pub fn intensity_meter(intensity: u8) -> String {
    let filled = usize::from(intensity.min(10));
    let mut meter = String::with_capacity(30);
    for _ in 0..filled {
        meter.push('▮');
    }
    for _ in filled..10 {
        meter.push('░');
    }
    meter
}

/// Fixed-width bracketed tag for a log kind (e.g., "[ data ]").
pub fn log_kind_tag(kind: LogKind) -> &'static str {
    match kind {
        LogKind::Info => "[ info ]",
        LogKind::Success => "[  ok  ]",
        LogKind::Warning => "[ warn ]",
        LogKind::Error => "[ fail ]",
        LogKind::Data => "[ data ]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_ms() {
        assert_eq!(format_elapsed_ms(842.0), "842ms");
        assert_eq!(format_elapsed_ms(2300.0), "2.3s");
        assert_eq!(format_elapsed_ms(72_000.0), "1m 12s");
    }

    #[test]
    fn test_intensity_meter() {
        assert_eq!(intensity_meter(0), "░░░░░░░░░░");
        assert_eq!(intensity_meter(7), "▮▮▮▮▮▮▮░░░");
        assert_eq!(intensity_meter(10), "▮▮▮▮▮▮▮▮▮▮");
        // Out-of-range scores saturate rather than overflow the meter
        assert_eq!(intensity_meter(14), "▮▮▮▮▮▮▮▮▮▮");
    }

    #[test]
    fn test_log_kind_tags_align() {
        for kind in [
            LogKind::Info,
            LogKind::Success,
            LogKind::Warning,
            LogKind::Error,
            LogKind::Data,
        ] {
            assert_eq!(log_kind_tag(kind).chars().count(), 8);
        }
    }
}
