use std::str::FromStr;

use rust_decimal::Decimal;

use crate::data::ParseError;

/// Parse a currency cell such as `$1,234.56` into a non-negative decimal.
pub fn parse_revenue(raw: &str) -> Result<Decimal, ParseError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    let value =
        Decimal::from_str(&cleaned).map_err(|_| ParseError::InvalidRevenue(raw.to_string()))?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ParseError::InvalidRevenue(raw.to_string()));
    }
    Ok(value)
}

/// Parse a visit count, tolerating thousands separators.
pub fn parse_visits(raw: &str) -> Result<u64, ParseError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidVisits(raw.to_string()))
}

/// Render a decimal as `$1,234.56`.
pub fn format_revenue(value: Decimal) -> String {
    let rendered = format!("{:.2}", value.round_dp(2).abs());
    let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value.is_sign_negative() && !value.is_zero() { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_revenue_strips_symbols() {
        assert_eq!(parse_revenue("$1,234.56").unwrap(), Decimal::new(123456, 2));
        assert_eq!(parse_revenue(" 10.00 ").unwrap(), Decimal::new(1000, 2));
        assert_eq!(parse_revenue("$0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_parse_revenue_rejects_garbage() {
        assert!(matches!(parse_revenue("n/a"), Err(ParseError::InvalidRevenue(_))));
        assert!(matches!(parse_revenue(""), Err(ParseError::InvalidRevenue(_))));
        assert!(matches!(parse_revenue("-$5.00"), Err(ParseError::InvalidRevenue(_))));
    }

    #[test]
    fn test_parse_visits() {
        assert_eq!(parse_visits("42").unwrap(), 42);
        assert_eq!(parse_visits("1,024").unwrap(), 1024);
        assert!(matches!(parse_visits("-1"), Err(ParseError::InvalidVisits(_))));
        assert!(matches!(parse_visits("many"), Err(ParseError::InvalidVisits(_))));
    }

    #[test]
    fn test_revenue_sum_and_format() {
        let total = parse_revenue("$1,234.56").unwrap() + parse_revenue("10.00").unwrap();
        assert_eq!(total, Decimal::new(124456, 2));
        assert_eq!(format_revenue(total), "$1,244.56");
    }

    #[test]
    fn test_format_revenue_grouping() {
        assert_eq!(format_revenue(Decimal::ZERO), "$0.00");
        assert_eq!(format_revenue(Decimal::new(999, 0)), "$999.00");
        assert_eq!(format_revenue(Decimal::new(1234567891, 2)), "$12,345,678.91");
        assert_eq!(format_revenue(Decimal::new(5, 1)), "$0.50");
    }
}
