use anyhow::{anyhow, Result};
use chrono::{Local, TimeZone};
use std::fmt::Display;

const HUMAN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a millisecond UNIX timestamp into a `YYYY-MM-DD HH:MM:SS` string
/// in the given timezone.
pub fn human_from_millis<Tz>(tz: &Tz, millis: i64) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let datetime = tz
        .timestamp_millis_opt(millis)
        .single()
        .ok_or(anyhow!("timestamp {millis} ms is out of range"))?;
    Ok(datetime.format(HUMAN_FORMAT).to_string())
}

/// Convert a millisecond UNIX timestamp into a `YYYY-MM-DD HH:MM:SS` string
/// in the local timezone of this machine.
pub fn human_local_from_millis(millis: i64) -> Result<String> {
    human_from_millis(&Local, millis)
}

#[cfg(test)]
mod tests {
    use super::human_from_millis;
    use chrono::Utc;

    #[test]
    fn formats_epoch_millis() {
        assert_eq!(
            human_from_millis(&Utc, 1700000000000).unwrap(),
            "2023-11-14 22:13:20"
        );
        assert_eq!(human_from_millis(&Utc, 0).unwrap(), "1970-01-01 00:00:00");
    }

    #[test]
    fn truncates_sub_second_precision() {
        assert_eq!(
            human_from_millis(&Utc, 1678886400123).unwrap(),
            "2023-03-15 13:20:00"
        );
    }

    #[test]
    fn rejects_out_of_range_timestamp() {
        assert!(human_from_millis(&Utc, i64::MAX).is_err());
    }
}
