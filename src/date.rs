//! Formats CMS timestamps for display. Dates are shown in the blog's locale
//! (Brazilian Portuguese) as "day abbreviated-month year", e.g. `25 mar 2021`,
//! and converted into the site's configured time zone first.

use chrono::{DateTime, FixedOffset, Locale, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// `d LLL y`: unpadded day, abbreviated month, full year.
const DATE_FORMAT: &str = "%-d %b %Y";

/// `H:mm`: unpadded 24-hour clock.
const HOUR_FORMAT: &str = "%-H:%M";

const LOCALE: Locale = Locale::pt_BR;

/// A localized date and hour pair, used for "edited at" annotations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateWithHour {
    pub date: String,
    pub hour: String,
}

/// Parses a CMS timestamp. Accepts RFC 3339 (`2021-03-25T19:25:28Z`), the
/// offset-without-colon form the CMS emits (`2021-03-25T19:25:28+0000`), and
/// bare dates (`2021-03-25`, taken as midnight UTC).
pub fn parse_timestamp(timestamp: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%z")
    {
        return Ok(dt);
    }
    match NaiveDate::parse_from_str(timestamp, "%Y-%m-%d") {
        Ok(date) => Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).into()),
        Err(err) => Err(Error::Parse {
            input: timestamp.to_owned(),
            err,
        }),
    }
}

/// Formats `timestamp` as a localized date in `tz`. Fails if the timestamp
/// can't be parsed.
pub fn format_date(timestamp: &str, tz: Tz) -> Result<String> {
    let local = parse_timestamp(timestamp)?.with_timezone(&tz);
    Ok(local.format_localized(DATE_FORMAT, LOCALE).to_string())
}

/// Formats `timestamp` as a localized date and hour in `tz`. A missing
/// timestamp yields `None`.
pub fn format_date_with_hour(
    timestamp: Option<&str>,
    tz: Tz,
) -> Result<Option<DateWithHour>> {
    let timestamp = match timestamp {
        None => return Ok(None),
        Some(timestamp) => timestamp,
    };
    let local = parse_timestamp(timestamp)?.with_timezone(&tz);
    Ok(Some(DateWithHour {
        date: local.format_localized(DATE_FORMAT, LOCALE).to_string(),
        hour: local.format_localized(HOUR_FORMAT, LOCALE).to_string(),
    }))
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem formatting a date.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a timestamp isn't in any of the accepted formats.
    #[error("parsing timestamp `{input}`: {err}")]
    Parse {
        input: String,
        #[source]
        err: chrono::ParseError,
    },
}
