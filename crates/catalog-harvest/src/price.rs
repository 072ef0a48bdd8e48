//! Price parsing for localized catalog price labels.
//!
//! Both `,` and `.` are read as the decimal separator when followed by
//! exactly two digits. Thousands separators are not recognised, so
//! `"1.234,56"` parses as `1.23`.

use std::sync::OnceLock;

use regex::Regex;

fn decimal_pair_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)[,.](\d{2})").expect("decimal pair regex is valid"))
}

fn digit_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("digit run regex is valid"))
}

/// Extract a numeric price from free-form price text.
///
/// Returns `None` for empty text or text without digits.
pub fn parse_price(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = decimal_pair_re().captures(text) {
        let value = format!("{}.{}", &caps[1], &caps[2]);
        if let Ok(price) = value.parse::<f64>() {
            return Some(price);
        }
    }

    digit_run_re()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_comma_decimal() {
        assert_eq!(parse_price("$ 219,00"), Some(219.0));
        assert_eq!(parse_price("49,90 $"), Some(49.9));
    }

    #[test]
    fn test_parse_price_period_decimal() {
        assert_eq!(parse_price("$49.90"), Some(49.9));
    }

    #[test]
    fn test_parse_price_whole_number() {
        assert_eq!(parse_price("$CAD 45"), Some(45.0));
        assert_eq!(parse_price("CAD 1299"), Some(1299.0));
    }

    #[test]
    fn test_parse_price_absent() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("no digits"), None);
    }

    #[test]
    fn test_parse_price_ignores_thousands_separator() {
        assert_eq!(parse_price("1.234,56 $"), Some(1.23));
        assert_eq!(parse_price("$ 1,299.00"), Some(1.29));
    }

    #[test]
    fn test_parse_price_takes_first_match() {
        assert_eq!(parse_price("$ 59,90 $ 39,90"), Some(59.9));
    }
}
