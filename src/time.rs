use chrono::{DateTime, FixedOffset};

/// Korea Standard Time is a fixed UTC+9 with no daylight saving.
const KST_OFFSET: &str = "+09:00";

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a GitHub timestamp (`2024-02-20T03:04:05Z`) to a KST display
/// string (`2024-02-20 12:04:05`).
pub fn to_kst(utc_timestamp: &str) -> Result<String, chrono::ParseError> {
    let kst: FixedOffset = KST_OFFSET.parse()?;
    let parsed = DateTime::parse_from_rfc3339(utc_timestamp)?;
    Ok(parsed.with_timezone(&kst).format(DISPLAY_FORMAT).to_string())
}
