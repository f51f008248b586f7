#[cfg(test)]
mod tests {
    use crate::models::time::{ClockTime, DayOfWeek, TimeError};

    #[test]
    fn test_clock_time_parse_hh_mm() {
        let t = ClockTime::parse("08:30").unwrap();
        assert_eq!(t.hour(), 8);
        assert_eq!(t.minute(), 30);
        assert_eq!(t.minutes(), 510);
    }

    #[test]
    fn test_clock_time_parse_single_digit_hour() {
        let t = ClockTime::parse("9:05").unwrap();
        assert_eq!(t.to_string(), "09:05");
    }

    #[test]
    fn test_clock_time_parse_truncates_seconds() {
        let t = ClockTime::parse("14:15:59").unwrap();
        assert_eq!(t, ClockTime::new(14, 15).unwrap());
    }

    #[test]
    fn test_clock_time_rejects_garbage() {
        for input in ["", "8", "8:", ":30", "24:00", "12:60", "ab:cd", "12:30:61", "1:2:3:4", "123:00"] {
            assert!(ClockTime::parse(input).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_clock_time_out_of_range_error() {
        let err = ClockTime::new(25, 0).unwrap_err();
        assert_eq!(err, TimeError::OutOfRange { hour: 25, minute: 0 });
    }

    #[test]
    fn test_clock_time_ordering() {
        let a = ClockTime::parse("08:00").unwrap();
        let b = ClockTime::parse("08:01").unwrap();
        assert!(a < b);
        assert_eq!(ClockTime::MIDNIGHT.minutes(), 0);
    }

    #[test]
    fn test_clock_time_from_minutes_bounds() {
        assert!(ClockTime::from_minutes(1439).is_ok());
        assert!(ClockTime::from_minutes(1440).is_err());
    }

    #[test]
    fn test_clock_time_serde_is_string() {
        let t = ClockTime::new(7, 5).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"07:05\"");
        let back: ClockTime = serde_json::from_str("\"07:05:00\"").unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<ClockTime>("\"7h05\"").is_err());
    }

    #[test]
    fn test_clock_time_naive_round_trip() {
        let t = ClockTime::new(23, 59).unwrap();
        assert_eq!(ClockTime::from_naive_time(t.to_naive_time()), t);
    }

    #[test]
    fn test_day_of_week_range() {
        assert!(DayOfWeek::new(0).is_ok());
        assert!(DayOfWeek::new(6).is_ok());
        assert_eq!(DayOfWeek::new(7).unwrap_err(), TimeError::InvalidDay(7));
        assert!(DayOfWeek::new(-1).is_err());
    }

    #[test]
    fn test_day_of_week_names() {
        assert_eq!(DayOfWeek::MONDAY.name(), "Monday");
        assert_eq!(DayOfWeek::SUNDAY.to_string(), "Sunday");
        assert_eq!(DayOfWeek::all().count(), 7);
    }

    #[test]
    fn test_day_of_week_from_name_accepts_english_german_and_digits() {
        assert_eq!(DayOfWeek::from_name("wednesday").unwrap(), DayOfWeek::WEDNESDAY);
        assert_eq!(DayOfWeek::from_name(" Freitag ").unwrap(), DayOfWeek::FRIDAY);
        assert_eq!(DayOfWeek::from_name("6").unwrap(), DayOfWeek::SUNDAY);
        assert!(matches!(
            DayOfWeek::from_name("someday"),
            Err(TimeError::UnknownDayName(_))
        ));
        assert!(DayOfWeek::from_name("9").is_err());
    }

    #[test]
    fn test_day_of_week_serde_is_integer() {
        assert_eq!(serde_json::to_string(&DayOfWeek::THURSDAY).unwrap(), "3");
        let day: DayOfWeek = serde_json::from_str("2").unwrap();
        assert_eq!(day, DayOfWeek::WEDNESDAY);
        assert!(serde_json::from_str::<DayOfWeek>("7").is_err());
    }

    #[test]
    fn test_day_of_week_chrono_mapping() {
        for day in DayOfWeek::all() {
            assert_eq!(DayOfWeek::from_chrono(day.to_chrono()), day);
        }
        assert_eq!(DayOfWeek::MONDAY.to_chrono(), chrono::Weekday::Mon);
    }
}
