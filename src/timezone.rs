//! Resolves the configured timezone so transaction dates land on the
//! business's calendar day rather than the server's.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// Get the UTC offset for a canonical timezone name, e.g. "Asia/Jakarta".
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current calendar date in `canonical_timezone`, falling back to UTC
/// when the timezone name is unknown.
pub fn current_local_date(canonical_timezone: &str) -> Date {
    match get_local_offset(canonical_timezone) {
        Some(offset) => OffsetDateTime::now_utc().to_offset(offset).date(),
        None => {
            tracing::warn!(
                "Unknown timezone {canonical_timezone:?}, using UTC for the transaction date."
            );
            OffsetDateTime::now_utc().date()
        }
    }
}
