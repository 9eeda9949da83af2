//! Display formatting for quote values.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::config::{FormatConfig, Grouping};
use crate::models::Money;

/// Format an amount with the currency symbol and digit grouping.
///
/// Paise are shown only when non-zero: `₹ 12,500` but `₹ 12,500.50`.
pub fn format_money(money: Money, format: &FormatConfig) -> String {
    let paise = money.paise();
    let rupees = paise / 100;
    let fraction = paise % 100;

    let grouped = group_digits(rupees as u64, format.grouping);
    let amount = if fraction == 0 {
        grouped
    } else {
        format!("{}.{:02}", grouped, fraction)
    };

    if format.currency_symbol.is_empty() {
        amount
    } else {
        format!("{} {}", format.currency_symbol, amount)
    }
}

/// Insert thousands separators.
pub fn group_digits(value: u64, grouping: Grouping) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, last3) = digits.split_at(digits.len() - 3);
    let step = match grouping {
        Grouping::Indian => 2,
        Grouping::Western => 3,
    };

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(step);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), last3)
}

pub fn format_date(date: NaiveDate, format: &FormatConfig) -> String {
    date.format(&format.date_format).to_string()
}

pub fn format_timestamp(at: NaiveDateTime, format: &FormatConfig) -> String {
    at.format(&format.timestamp_format).to_string()
}

pub fn format_years(years: u32) -> String {
    if years == 1 {
        "1 year".to_string()
    } else {
        format!("{} years", years)
    }
}

/// Completed years between `dob` and `on`. `None` if `dob` is in the future.
pub fn age_on(dob: NaiveDate, on: NaiveDate) -> Option<u32> {
    let mut years = on.year() - dob.year();
    if (on.month(), on.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(grouping: Grouping) -> FormatConfig {
        FormatConfig {
            grouping,
            ..FormatConfig::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_indian_grouping() {
        assert_eq!(group_digits(999, Grouping::Indian), "999");
        assert_eq!(group_digits(1_000, Grouping::Indian), "1,000");
        assert_eq!(group_digits(100_000, Grouping::Indian), "1,00,000");
        assert_eq!(group_digits(10_000_000, Grouping::Indian), "1,00,00,000");
    }

    #[test]
    fn test_western_grouping() {
        assert_eq!(group_digits(10_000_000, Grouping::Western), "10,000,000");
        assert_eq!(group_digits(123_456, Grouping::Western), "123,456");
    }

    #[test]
    fn test_format_money() {
        let money = Money::new(1_250_000.0).unwrap();
        assert_eq!(format_money(money, &fmt(Grouping::Indian)), "₹ 12,50,000");

        let money = Money::new(15_234.5).unwrap();
        assert_eq!(format_money(money, &fmt(Grouping::Western)), "₹ 15,234.50");

        let plain = FormatConfig {
            currency_symbol: String::new(),
            ..fmt(Grouping::Western)
        };
        assert_eq!(format_money(Money::new(0.0).unwrap(), &plain), "0");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date(1990, 4, 1), &FormatConfig::default()), "01-04-1990");
    }

    #[test]
    fn test_age_on() {
        assert_eq!(age_on(date(1990, 4, 1), date(2024, 3, 31)), Some(33));
        assert_eq!(age_on(date(1990, 4, 1), date(2024, 4, 1)), Some(34));
        assert_eq!(age_on(date(2030, 1, 1), date(2024, 4, 1)), None);
    }

    #[test]
    fn test_format_years() {
        assert_eq!(format_years(1), "1 year");
        assert_eq!(format_years(40), "40 years");
    }
}
