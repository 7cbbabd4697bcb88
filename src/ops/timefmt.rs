use regex::Regex;
use std::sync::OnceLock;

fn hhmmss_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9]{1,2}:[0-5][0-9]:[0-5][0-9]$").expect("valid HH:MM:SS pattern")
    })
}

/// Short clock format: "M:SS" below one hour, "H:MM:SS" from one hour up.
/// Hours are unpadded; minutes and seconds are zero-padded once hours appear.
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Round-trip format for the manual time fields: always "HH:MM:SS",
/// every component zero-padded to two digits.
pub fn format_time_hhmmss(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Lenient time-string parser: "S", "M:S" or "H:M:S". Segments that fail
/// integer parsing count as 0; any other segment count yields 0.
pub fn parse_time_to_seconds(text: &str) -> u64 {
    let parts: Vec<u64> = text
        .split(':')
        .map(|p| p.trim().parse().unwrap_or(0))
        .collect();

    match parts.as_slice() {
        [h, m, s] => h * 3600 + m * 60 + s,
        [m, s] => m * 60 + s,
        [s] => *s,
        _ => 0,
    }
}

/// Strict pre-submission check for the manual fields: "HH:MM:SS" with
/// minutes and seconds in 00..59. Hours may be one or two digits.
pub fn is_valid_hhmmss(text: &str) -> bool {
    hhmmss_pattern().is_match(text)
}

/// Blur normalization for the manual fields: a bare number is read as
/// seconds and rewritten in zero-padded HH:MM:SS. Anything already
/// containing ':' (or not a number) is left alone.
pub fn normalize_bare_seconds(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains(':') {
        return None;
    }
    let total: u64 = trimmed.parse().ok()?;
    Some(format_time_hhmmss(total as f64))
}
