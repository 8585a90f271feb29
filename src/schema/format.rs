//! Text-format detection for discovered columns
//!
//! A text column whose every observed value matches one well-known format is
//! tagged with it, giving the sink the option of a narrower storage type.
//! Cheap byte checks gate the regex matches so the common case (plain text)
//! never touches a regex.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static ISO_DATETIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap()
});

static ISO_DATE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static ISO_TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}(.\d+)?$").unwrap());

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static IPV4_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").unwrap());

static IPV6_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(([0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,7}:|([0-9a-fA-F]{1,4}:){1,6}:[0-9a-fA-F]{1,4})$").unwrap()
});

/// Well-known text formats a column can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextFormat {
    Date,
    DateTime,
    Time,
    Email,
    Uuid,
    Ipv4,
    Ipv6,
    Uri,
}

impl TextFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            TextFormat::Date => "date",
            TextFormat::DateTime => "date-time",
            TextFormat::Time => "time",
            TextFormat::Email => "email",
            TextFormat::Uuid => "uuid",
            TextFormat::Ipv4 => "ipv4",
            TextFormat::Ipv6 => "ipv6",
            TextFormat::Uri => "uri",
        }
    }
}

/// Detect if a string matches a known format
pub fn detect_format(value: &str) -> Option<TextFormat> {
    let len = value.len();

    if len == 0 {
        return None;
    }

    // URI - fast byte check
    if len > 6
        && (value.starts_with("http://")
            || value.starts_with("https://")
            || value.starts_with("ftp://")
            || value.starts_with("file://"))
    {
        return Some(TextFormat::Uri);
    }

    // ISO Date - fixed length with fast pattern
    if len == 10 && value.as_bytes()[4] == b'-' && value.as_bytes()[7] == b'-' {
        if ISO_DATE_REGEX.is_match(value) {
            return Some(TextFormat::Date);
        }
    }

    // Email - common pattern check before regex
    if len > 5 && len < 255 && value.contains('@') {
        if EMAIL_REGEX.is_match(value) {
            return Some(TextFormat::Email);
        }
    }

    // UUID - fixed length
    if len == 36 && value.as_bytes()[8] == b'-' {
        if UUID_REGEX.is_match(&value.to_lowercase()) {
            return Some(TextFormat::Uuid);
        }
    }

    // DateTime - check length and T separator before regex
    if len >= 19 && value.as_bytes()[10] == b'T' {
        if ISO_DATETIME_REGEX.is_match(value) {
            return Some(TextFormat::DateTime);
        }
    }

    // Time - colon separator
    if len >= 8 && value.contains(':') {
        if ISO_TIME_REGEX.is_match(value) {
            return Some(TextFormat::Time);
        }
    }

    // IPv4 - simple dot count check
    if len < 16 && value.contains('.') {
        if IPV4_REGEX.is_match(value) && value.split('.').all(|part| part.parse::<u8>().is_ok()) {
            return Some(TextFormat::Ipv4);
        }
    }

    // IPv6 - must have colons
    if value.contains(':') {
        if IPV6_REGEX.is_match(value) {
            return Some(TextFormat::Ipv6);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format_email() {
        assert_eq!(detect_format("test@example.com"), Some(TextFormat::Email));
    }

    #[test]
    fn test_detect_format_uuid() {
        assert_eq!(
            detect_format("550e8400-e29b-41d4-a716-446655440000"),
            Some(TextFormat::Uuid)
        );
    }

    #[test]
    fn test_detect_format_date() {
        assert_eq!(detect_format("2021-01-01"), Some(TextFormat::Date));
    }

    #[test]
    fn test_detect_format_datetime() {
        assert_eq!(
            detect_format("2021-01-01T12:30:00Z"),
            Some(TextFormat::DateTime)
        );
    }

    #[test]
    fn test_detect_format_uri() {
        assert_eq!(detect_format("https://example.com/x"), Some(TextFormat::Uri));
    }

    #[test]
    fn test_detect_format_ipv4() {
        assert_eq!(detect_format("192.168.0.1"), Some(TextFormat::Ipv4));
        assert_eq!(detect_format("999.168.0.1"), None);
    }

    #[test]
    fn test_plain_text_has_no_format() {
        assert_eq!(detect_format("just some words"), None);
        assert_eq!(detect_format(""), None);
    }
}
