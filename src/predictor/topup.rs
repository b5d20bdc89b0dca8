//! Top-up suggestion arithmetic

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopUpPeriod {
    /// Rest of the current calendar month
    Month,
    Days(u32),
}

impl TopUpPeriod {
    /// `"month"` (any case) or a positive whole number of days
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("month") {
            return Some(TopUpPeriod::Month);
        }
        match raw.parse::<u32>() {
            Ok(days) if days > 0 => Some(TopUpPeriod::Days(days)),
            _ => None,
        }
    }

    pub fn days(&self, today: NaiveDate) -> u32 {
        match self {
            TopUpPeriod::Month => days_remaining_in_month(today),
            TopUpPeriod::Days(days) => *days,
        }
    }

    pub fn label(&self) -> String {
        match self {
            TopUpPeriod::Month => "1 Month".to_string(),
            TopUpPeriod::Days(1) => "1 Day".to_string(),
            TopUpPeriod::Days(days) => format!("{} Days", days),
        }
    }
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Whole days left after `today` (0 on the last day of the month)
pub fn days_remaining_in_month(today: NaiveDate) -> u32 {
    days_in_month(today) - today.day()
}

/// Money needed to cover `days` of `daily_usage` at `rate` units per currency unit
pub fn top_up_amount(daily_usage: f64, days: u32, rate: f64) -> f64 {
    daily_usage * days as f64 / rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(TopUpPeriod::parse("month"), Some(TopUpPeriod::Month));
        assert_eq!(TopUpPeriod::parse(" Month "), Some(TopUpPeriod::Month));
        assert_eq!(TopUpPeriod::parse("7"), Some(TopUpPeriod::Days(7)));
        assert_eq!(TopUpPeriod::parse("0"), None);
        assert_eq!(TopUpPeriod::parse("-3"), None);
        assert_eq!(TopUpPeriod::parse("week"), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(TopUpPeriod::Month.label(), "1 Month");
        assert_eq!(TopUpPeriod::Days(1).label(), "1 Day");
        assert_eq!(TopUpPeriod::Days(14).label(), "14 Days");
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(date(2024, 2, 10)), 29);
        assert_eq!(days_in_month(date(2023, 2, 10)), 28);
        assert_eq!(days_in_month(date(2024, 12, 31)), 31);
        assert_eq!(days_in_month(date(2024, 4, 1)), 30);
    }

    #[test]
    fn test_days_remaining() {
        assert_eq!(days_remaining_in_month(date(2024, 1, 1)), 30);
        assert_eq!(days_remaining_in_month(date(2024, 1, 31)), 0);
        assert_eq!(TopUpPeriod::Month.days(date(2024, 6, 20)), 10);
        assert_eq!(TopUpPeriod::Days(3).days(date(2024, 6, 20)), 3);
    }

    #[test]
    fn test_top_up_amount() {
        // 11.7 kWh/day for 10 days at 1.17 kWh per Rand is R100
        assert_relative_eq!(top_up_amount(11.7, 10, 1.17), 100.0, epsilon = 1e-9);
        assert_relative_eq!(top_up_amount(200.0, 1, 40.0), 5.0, epsilon = 1e-9);
        assert_eq!(top_up_amount(5.0, 0, 0.02), 0.0);
    }
}
