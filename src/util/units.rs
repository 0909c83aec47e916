//! Human-readable formatting for report values

use std::time::Duration;

/// Format a duration with a unit matched to its magnitude
///
/// # Examples
///
/// ```
/// use kvpulse::util::units::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(850)), "850ns");
/// assert_eq!(format_duration(Duration::from_nanos(1_250)), "1.25us");
/// assert_eq!(format_duration(Duration::from_millis(42)), "42.00ms");
/// assert_eq!(format_duration(Duration::from_secs(3)), "3.00s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    match nanos {
        0..=999 => format!("{}ns", nanos),
        1_000..=999_999 => format!("{:.2}us", nanos as f64 / 1e3),
        1_000_000..=999_999_999 => format!("{:.2}ms", nanos as f64 / 1e6),
        _ => format!("{:.2}s", nanos as f64 / 1e9),
    }
}

/// Format an events-per-second rate with a decimal suffix
///
/// ```
/// use kvpulse::util::units::format_rate;
///
/// assert_eq!(format_rate(950.0), "950");
/// assert_eq!(format_rate(12_500.0), "12.50K");
/// assert_eq!(format_rate(3_000_000.0), "3.00M");
/// ```
pub fn format_rate(rate: f64) -> String {
    const SUFFIXES: [(f64, &str); 3] = [(1e9, "G"), (1e6, "M"), (1e3, "K")];
    for (scale, suffix) in SUFFIXES {
        if rate >= scale {
            return format!("{:.2}{}", rate / scale, suffix);
        }
    }
    format!("{:.0}", rate)
}

/// Format a byte count with a binary suffix
///
/// ```
/// use kvpulse::util::units::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1536), "1.50 KiB");
/// assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MiB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = None;
    for candidate in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = Some(candidate);
    }
    match unit {
        Some(unit) => format!("{:.2} {}", value, unit),
        None => format!("{} B", bytes),
    }
}

/// Group digits in thousands (`1234567` becomes `1,234,567`)
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_bytes_boundaries() {
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KiB");
    }

    #[test]
    fn test_format_rate_small() {
        assert_eq!(format_rate(0.0), "0");
        assert_eq!(format_rate(1000.0), "1.00K");
    }
}
