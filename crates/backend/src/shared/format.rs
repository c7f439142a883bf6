/// Round to two decimal places, the precision used for prices and
/// converted dimensions in the feed.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Render an amount the way the feed expects it: two decimals, but no
/// trailing zeros beyond what the value needs ("12.5" not "12.50"
/// stays "12.5" in the source data, so we normalise to plain decimal).
pub fn format_amount(value: f64) -> String {
    let rounded = round2(value);
    if (rounded - rounded.trunc()).abs() < f64::EPSILON {
        format!("{}", rounded.trunc() as i64)
    } else {
        let s = format!("{:.2}", rounded);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Format a byte count with thousands separators for log messages.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(110.004_999), 110.0);
        assert_eq!(round2(54.999_6), 55.0);
        assert_eq!(round2(19.995), 20.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(100.0), "100");
        assert_eq!(format_amount(110.0), "110");
        assert_eq!(format_amount(25.4), "25.4");
        assert_eq!(format_amount(19.99), "19.99");
        assert_eq!(format_amount(19.999), "20");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(42), "42");
        assert_eq!(format_number(1000), "1.000");
        assert_eq!(format_number(1234567), "1.234.567");
    }
}
