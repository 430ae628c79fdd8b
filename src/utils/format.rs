/// Render a count with `,` thousands separators, e.g. `12000` -> `"12,000"`.
///
/// Fractional values keep up to three decimals with trailing zeros trimmed.
pub fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let negative = value < 0.0;
    let rounded = (value.abs() * 1000.0).round() / 1000.0;
    let integral = rounded.trunc() as u64;
    let fraction = rounded - rounded.trunc();

    let digits = integral.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction > 0.0 {
        let decimals = format!("{fraction:.3}");
        let decimals = decimals.trim_start_matches('0').trim_end_matches('0');
        grouped.push_str(decimals);
    }

    if negative && grouped != "0" {
        grouped.insert(0, '-');
    }
    grouped
}

/// Shortest decimal rendering of a measurement: integral values print without
/// a fractional part (`12000`, not `12000.0`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(12000.0), "12,000");
        assert_eq!(format_count(1234567.0), "1,234,567");
        assert_eq!(format_count(-15000.0), "-15,000");
    }

    #[test]
    fn keeps_short_fractions() {
        assert_eq!(format_count(1500.5), "1,500.5");
        assert_eq!(format_count(2.25), "2.25");
    }

    #[test]
    fn integral_numbers_have_no_fraction() {
        assert_eq!(format_number(12000.0), "12000");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(25.4), "25.4");
    }
}
