use chrono::{DateTime, NaiveDateTime};

/// Wire format of booking start and end times.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a booking timestamp. Values carrying an offset are converted to UTC
/// wall-clock time; everything else is taken as-is.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_wire_format_and_browser_variants() {
        let expected = parse_timestamp("2025-05-01T09:00:00").unwrap();

        assert_eq!(parse_timestamp("2025-05-01 09:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-01T09:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-01T09:00:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-05-01T11:00:00+02:00"), Some(expected));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("tomorrow at nine"), None);
        assert_eq!(parse_timestamp("2025-13-01T09:00:00"), None);
    }

    #[test]
    fn formats_without_fraction() {
        let value = parse_timestamp("2025-05-01T09:00:00.250").unwrap();
        assert_eq!(format_timestamp(value), "2025-05-01T09:00:00");
    }
}
