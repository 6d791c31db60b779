/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use energy_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let fixed = format!("{:.*}", decimals as usize, value.abs());
    let (digits, fraction) = match fixed.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (fixed.as_str(), None),
    };

    let mut out = group_thousands(digits);
    if let Some(frac) = fraction {
        out.push('.');
        out.push_str(frac);
    }

    // No sign on a value that rounds to zero.
    if value < 0.0 && out.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        out.insert(0, '-');
    }
    out
}

/// Format an energy amount as `"1,234.50 kWh"`.
///
/// ```
/// use energy_core::formatting::format_kwh;
///
/// assert_eq!(format_kwh(1234.5), "1,234.50 kWh");
/// ```
pub fn format_kwh(value: f64) -> String {
    format!("{} kWh", format_number(value, 2))
}

/// Like [`format_kwh`] but renders an undefined statistic as `"n/a"`.
pub fn format_optional_kwh(value: Option<f64>) -> String {
    value.map(format_kwh).unwrap_or_else(|| "n/a".to_string())
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// ```
/// use energy_core::formatting::percentage;
///
/// assert!((percentage(50.0, 200.0, 1) - 25.0).abs() < 1e-9);
/// assert_eq!(percentage(0.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

/// Insert a comma before every group of three digits, counted from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
    }

    #[test]
    fn test_format_number_negative_zero_after_rounding() {
        assert_eq!(format_number(-0.001, 2), "0.00");
    }

    #[test]
    fn test_format_number_rounds_to_precision() {
        assert_eq!(format_number(1_234.5678, 2), "1,234.57");
        assert_eq!(format_number(999.996, 2), "1,000.00");
    }

    #[test]
    fn test_format_kwh() {
        assert_eq!(format_kwh(15.0), "15.00 kWh");
        assert_eq!(format_kwh(1_234_567.891), "1,234,567.89 kWh");
    }

    #[test]
    fn test_format_optional_kwh() {
        assert_eq!(format_optional_kwh(Some(2.5)), "2.50 kWh");
        assert_eq!(format_optional_kwh(None), "n/a");
    }

    #[test]
    fn test_percentage() {
        assert!((percentage(100.0, 150.0, 1) - 66.7).abs() < 1e-9);
        assert_eq!(percentage(10.0, 0.0, 2), 0.0);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("5"), "5");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }
}
