use chrono::{DateTime, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 12 * MONTH;

/// Format the distance between `then` (Unix seconds) and `now` as English.
///
/// Produces "now", "1 second ago", "33 minutes ago", "3 weeks ago" and so
/// on. Timestamps after `now` read "... from now". Month and year are fixed
/// 30 and 360 day spans, which is close enough for a front page.
pub fn humanize_since(then: i64, now: DateTime<Utc>) -> String {
    let diff = now.timestamp().saturating_sub(then);
    let (secs, suffix) = if diff < 0 {
        (diff.saturating_neg(), "from now")
    } else {
        (diff, "ago")
    };

    if secs < 1 {
        return "now".to_string();
    }

    let phrase = if secs < 2 {
        "1 second".to_string()
    } else if secs < MINUTE {
        format!("{secs} seconds")
    } else if secs < 2 * MINUTE {
        "1 minute".to_string()
    } else if secs < HOUR {
        format!("{} minutes", secs / MINUTE)
    } else if secs < 2 * HOUR {
        "1 hour".to_string()
    } else if secs < DAY {
        format!("{} hours", secs / HOUR)
    } else if secs < 2 * DAY {
        "1 day".to_string()
    } else if secs < WEEK {
        format!("{} days", secs / DAY)
    } else if secs < 2 * WEEK {
        "1 week".to_string()
    } else if secs < MONTH {
        format!("{} weeks", secs / WEEK)
    } else if secs < 2 * MONTH {
        "1 month".to_string()
    } else if secs < YEAR {
        format!("{} months", secs / MONTH)
    } else if secs < 18 * MONTH {
        "1 year".to_string()
    } else if secs < 2 * YEAR {
        "2 years".to_string()
    } else {
        format!("{} years", secs / YEAR)
    };

    format!("{phrase} {suffix}")
}
