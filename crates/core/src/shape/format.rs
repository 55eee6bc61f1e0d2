//! Display formatting for prices and dates.

use chrono::{DateTime, NaiveDate, Utc};

/// Insert `,` every three digits.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Monthly rent in yen: `150000` → `¥150,000`.
#[must_use]
pub fn format_yen(amount: u64) -> String {
    format!("¥{}", group_thousands(amount))
}

/// Stored dollar figure; absent renders as `$0`. Never derived from the yen price.
#[must_use]
pub fn format_usd(amount: Option<u64>) -> String {
    format!("${}", group_thousands(amount.unwrap_or(0)))
}

/// `Mar 5, 2025`.
#[must_use]
pub fn format_datetime(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// Format an RFC 3339 timestamp or a bare `YYYY-MM-DD` date; absent or
/// unparsable input yields an empty string.
#[must_use]
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim) else {
        return String::new();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return format_datetime(&dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

/// At most two decimals, trailing zeros dropped: `2.0` → `2`, `1.5` → `1.5`.
#[must_use]
pub fn format_number(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_yen() {
        assert_eq!(format_yen(150_000), "¥150,000");
        assert_eq!(format_yen(0), "¥0");
        assert_eq!(format_yen(999), "¥999");
        assert_eq!(format_yen(1_000), "¥1,000");
        assert_eq!(format_yen(12_345_678), "¥12,345,678");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(None), "$0");
        assert_eq!(format_usd(Some(1_000)), "$1,000");
        assert_eq!(format_usd(Some(950)), "$950");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(Some("2025-03-05T10:30:00Z")), "Mar 5, 2025");
        assert_eq!(format_date(Some("2025-12-25T23:00:00+09:00")), "Dec 25, 2025");
        assert_eq!(format_date(Some("2025-04-01")), "Apr 1, 2025");
        assert_eq!(format_date(Some("yesterday")), "");
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(85.25), "85.25");
        assert_eq!(format_number(1.999), "2");
        assert_eq!(format_number(0.004), "0");
    }
}
