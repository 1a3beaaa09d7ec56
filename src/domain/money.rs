use std::fmt;

/// Amounts are integer cents: ¥12.50 is stored as 1250.
pub type Cents = i64;

/// Format cents as a decimal string with two places.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let (units_str, decimal_str) = match input.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (input, ""),
    };

    if units_str.is_empty() && decimal_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !decimal_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?
    };

    // "5" after the point means 50 cents; anything past two digits is dropped
    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        1 => decimal_str.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10,
        _ => decimal_str[..2]
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::Overflow)?;
    Ok(if negative { -cents } else { cents })
}

/// Parse a user-entered amount, accepting only strictly positive values.
pub fn parse_amount(input: &str) -> Result<Cents, ParseCentsError> {
    let cents = parse_cents(input)?;
    if cents <= 0 {
        return Err(ParseCentsError::NotPositive);
    }
    Ok(cents)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    NotPositive,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::NotPositive => write!(f, "amount must be greater than zero"),
            ParseCentsError::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("7."), Ok(700));
        assert_eq!(parse_cents(" 3.20 "), Ok(320));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
        assert_eq!(parse_cents("100.999"), Ok(10099)); // Truncates
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert_eq!(parse_cents("abc"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("12.34.56"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents(""), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("."), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("1e5"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(
            parse_cents("999999999999999999999"),
            Err(ParseCentsError::InvalidFormat)
        );
        assert_eq!(
            parse_cents("99999999999999999"),
            Err(ParseCentsError::Overflow)
        );
    }

    #[test]
    fn test_parse_amount_rejects_non_positive() {
        assert_eq!(parse_amount("0"), Err(ParseCentsError::NotPositive));
        assert_eq!(parse_amount("0.00"), Err(ParseCentsError::NotPositive));
        assert_eq!(parse_amount("-3"), Err(ParseCentsError::NotPositive));
        assert_eq!(parse_amount("0.001"), Err(ParseCentsError::NotPositive));
        assert_eq!(parse_amount("0.01"), Ok(1));
    }
}
