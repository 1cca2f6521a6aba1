//! Display formatting for object listings: byte sizes and timestamps.

use chrono::{DateTime, Local, SecondsFormat, Utc};

const SIZE_UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

/// Format a byte count for humans.
///
/// Values below 1024 are printed as whole bytes (`"512 bytes"`), larger ones
/// with one decimal in binary units (`"1.5 KB"`, `"3.0 MB"`).
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, SIZE_UNITS[unit])
}

/// Local wall-clock rendering, e.g. `19.10.2026 14:03:11`.
pub fn format_user_time(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%d.%m.%Y %H:%M:%S")
        .to_string()
}

/// Strict ISO-8601 offset timestamp with millisecond precision.
pub fn format_iso8601(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn small_sizes_are_plain_bytes() {
        assert_eq!(format_size(0), "0 bytes");
        assert_eq!(format_size(5), "5 bytes");
        assert_eq!(format_size(1023), "1023 bytes");
    }

    #[test]
    fn larger_sizes_use_binary_units() {
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn iso8601_is_utc_with_millis() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 9, 17, 45, 2).unwrap();
        assert_eq!(format_iso8601(instant), "2024-03-09T17:45:02.000Z");
        assert_eq!(
            format_iso8601(DateTime::<Utc>::UNIX_EPOCH),
            "1970-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn user_time_has_day_first_layout() {
        let rendered = format_user_time(Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap());
        assert_eq!(rendered.len(), "09.03.2024 12:00:00".len());
        assert_eq!(&rendered[2..3], ".");
        assert_eq!(&rendered[5..6], ".");
    }
}
