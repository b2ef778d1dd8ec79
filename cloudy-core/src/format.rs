use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

/// `HH:MM` in `tz`, or `--:--` when the epoch is out of range.
pub fn time_of_day<Tz>(epoch_secs: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .map(|utc| utc.with_timezone(tz).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

pub fn day_name<Tz>(instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.format("%A").to_string()
}

/// e.g. `07 March 2025`
pub fn calendar_date<Tz>(instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.format("%d %B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn time_of_day_is_zero_padded_24_hour() {
        // 2024-01-15 05:07:00 UTC
        assert_eq!(time_of_day(1_705_295_220, &Utc), "05:07");
        // 2024-01-15 17:30:00 UTC
        assert_eq!(time_of_day(1_705_339_800, &Utc), "17:30");
    }

    #[test]
    fn time_of_day_uses_the_given_zone() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let honolulu = FixedOffset::west_opt(10 * 3600).unwrap();

        assert_eq!(time_of_day(1_705_295_220, &tokyo), "14:07");
        assert_eq!(time_of_day(1_705_295_220, &honolulu), "19:07");
    }

    #[test]
    fn out_of_range_epoch_renders_placeholder() {
        assert_eq!(time_of_day(i64::MAX, &Utc), "--:--");
    }

    #[test]
    fn day_and_date_follow_the_instant() {
        let instant = Utc.with_ymd_and_hms(2025, 3, 7, 23, 30, 0).unwrap();
        assert_eq!(day_name(&instant), "Friday");
        assert_eq!(calendar_date(&instant), "07 March 2025");

        let next_day = instant.with_timezone(&FixedOffset::east_opt(3600).unwrap());
        assert_eq!(day_name(&next_day), "Saturday");
        assert_eq!(calendar_date(&next_day), "08 March 2025");
    }
}
