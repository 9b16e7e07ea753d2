use anyhow::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Timelike, Utc};

/// Format used by activity feed dates, e.g. `03-Jan-2024 16:05`.
pub const ALOG_DATE_FORMAT: &str = "%d-%b-%Y %H:%M";

pub fn parse_alog_date(date_str: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(date_str.trim(), ALOG_DATE_FORMAT)
        .map_err(|e| anyhow::anyhow!("Invalid activity date {:?}: {}", date_str, e))?;
    Ok(naive.and_utc())
}

pub fn format_cap_date(datetime: DateTime<Utc>) -> String {
    datetime.format("%d-%b-%Y").to_string()
}

pub fn format_cap_time(datetime: DateTime<Utc>) -> String {
    datetime.format("%H:%M").to_string()
}

/// Most recent moment at or before `now` falling on `day` (Monday = 0) at `hour`, UTC.
pub fn compute_build_tick(day: u32, hour: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let days_back = (now.weekday().num_days_from_monday() as i64 - day as i64).rem_euclid(7);
    let hours_back = now.hour() as i64 - hour as i64;

    let tick = now
        - Duration::days(days_back)
        - Duration::hours(hours_back)
        - Duration::minutes(now.minute() as i64)
        - Duration::seconds(now.second() as i64)
        - Duration::nanoseconds(now.nanosecond() as i64);

    // Same weekday but before the reset hour lands later today.
    if tick > now {
        tick - Duration::days(7)
    } else {
        tick
    }
}
