use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResetRuleError {
    #[error("Must enter a valid day of the week (Monday, Tuesday, etc.)")]
    InvalidDay,
    #[error("Must enter an hour between 0 and 23.")]
    InvalidHour,
}

const DAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Maps a weekday name to its index, Monday = 0.
pub fn validate_day(day_str: &str) -> Result<u32, ResetRuleError> {
    let day = day_str.trim().to_lowercase();
    DAYS.iter()
        .position(|d| *d == day)
        .map(|i| i as u32)
        .ok_or(ResetRuleError::InvalidDay)
}

pub fn validate_hour(hour_str: &str) -> Result<u32, ResetRuleError> {
    match hour_str.trim().parse::<u32>() {
        Ok(hour) if hour < 24 => Ok(hour),
        _ => Err(ResetRuleError::InvalidHour),
    }
}

pub fn day_name(day: u32) -> &'static str {
    match day {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_are_case_insensitive() {
        assert_eq!(validate_day("Wednesday"), Ok(2));
        assert_eq!(validate_day("SUNDAY"), Ok(6));
        assert_eq!(validate_day("funday"), Err(ResetRuleError::InvalidDay));
    }

    #[test]
    fn hours_must_fit_a_day() {
        assert_eq!(validate_hour("0"), Ok(0));
        assert_eq!(validate_hour("23"), Ok(23));
        assert_eq!(validate_hour("24"), Err(ResetRuleError::InvalidHour));
        assert_eq!(validate_hour("noon"), Err(ResetRuleError::InvalidHour));
    }
}
