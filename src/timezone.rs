use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, OffsetResult, PrimitiveDateTimeExt, TimeZone};

/// Get the current UTC offset of a canonical timezone name, e.g. "Pacific/Auckland".
///
/// Returns `None` if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Get the instant of midnight at the start of `date` in the timezone `canonical_timezone`.
///
/// If midnight happens twice on `date` the earlier instant is used. If a DST
/// transition skips midnight, the offset in effect at midnight UTC is used.
pub(crate) fn local_midnight(date: Date, canonical_timezone: &str) -> Option<OffsetDateTime> {
    let tz = time_tz::timezones::get_by_name(canonical_timezone)?;
    let midnight = date.midnight();

    let local = match midnight.assume_timezone(tz) {
        OffsetResult::Some(local) => local,
        OffsetResult::Ambiguous(first, second) => first.min(second),
        OffsetResult::None => midnight.assume_timezone_utc(tz),
    };

    Some(local)
}

/// Get today's date in the timezone `canonical_timezone`.
pub(crate) fn local_today(canonical_timezone: &str) -> Option<Date> {
    let offset = get_local_offset(canonical_timezone)?;

    Some(OffsetDateTime::now_utc().to_offset(offset).date())
}
