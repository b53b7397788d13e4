//! Money and count formatting with thousands separators.

/// Insert separators into a run of ASCII digits.
fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn group_thousands(value: u64) -> String {
    group_digits(&value.to_string())
}

/// `1250.0` -> `1,250.00`. Non-finite values render as `n/a`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let zero = whole.bytes().chain(cents.bytes()).all(|b| b == b'0');
    let sign = if value < 0.0 && !zero { "-" } else { "" };
    format!("{}{}.{}", sign, group_digits(whole), cents)
}

pub fn format_money(value: f64, currency: &str) -> String {
    let symbol = match currency.to_ascii_uppercase().as_str() {
        "USD" => "$",
        "INR" => "₹",
        "EUR" => "€",
        "GBP" => "£",
        "" => "",
        _ => return format!("{} {}", currency.to_ascii_uppercase(), format_amount(value)),
    };
    format!("{}{}", symbol, format_amount(value))
}

pub fn format_count(value: u64) -> String {
    group_thousands(value)
}

/// Whole numbers without a fraction, others with up to two decimals.
pub fn format_quantity(value: f64) -> String {
    if !value.is_finite() {
        "n/a".to_string()
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        let text = format!("{:.2}", value);
        text.trim_end_matches('0').to_string()
    }
}

/// Relative change as a signed percentage; `None` without a baseline.
pub fn percent_change(current: f64, baseline: f64) -> Option<f64> {
    (baseline.abs() > f64::EPSILON).then(|| (current - baseline) / baseline * 100.0)
}

pub fn format_delta(current: f64, baseline: f64) -> String {
    match percent_change(current, baseline) {
        Some(pct) => format!("{:+.1}%", pct),
        None => "n/a".to_string(),
    }
}

pub fn plural<'a>(count: u64, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1250.0), "1,250.00");
        assert_eq!(format_amount(0.5), "0.50");
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(-42.0), "-42.00");
        assert_eq!(format_amount(999.999), "1,000.00");
    }

    #[test]
    fn test_format_money_symbols() {
        assert_eq!(format_money(1250.0, "USD"), "$1,250.00");
        assert_eq!(format_money(1250.0, "inr"), "₹1,250.00");
        assert_eq!(format_money(10.0, "AED"), "AED 10.00");
        assert_eq!(format_money(10.0, ""), "10.00");
    }

    #[test]
    fn test_counts_and_quantities() {
        assert_eq!(format_count(5870), "5,870");
        assert_eq!(format_count(1_000_000), "1,000,000");
        assert_eq!(format_quantity(10.0), "10");
        assert_eq!(format_quantity(2.5), "2.5");
    }

    #[test]
    fn test_huge_and_non_finite_values_are_not_clamped() {
        assert_eq!(format_amount(1e21), "1,000,000,000,000,000,000,000.00");
        assert_eq!(format_amount(f64::NAN), "n/a");
        assert_eq!(format_amount(f64::INFINITY), "n/a");
        assert_eq!(format_amount(-0.001), "0.00");
        assert_eq!(format_quantity(1e21), "1000000000000000000000");
        assert_eq!(format_quantity(f64::NEG_INFINITY), "n/a");
    }

    #[test]
    fn test_delta() {
        assert_eq!(format_delta(120.0, 100.0), "+20.0%");
        assert_eq!(format_delta(80.0, 100.0), "-20.0%");
        assert_eq!(format_delta(5.0, 0.0), "n/a");
    }
}
