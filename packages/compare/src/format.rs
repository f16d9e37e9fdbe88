//! The display formatting rule shared by primary, comparison and delta
//! values.

use census_explorer_metric_models::RawValue;

/// Rendered in place of missing or non-numeric values.
pub const NO_DATA: &str = "N/A";

/// Formats a number for display.
///
/// Values of at least one million render as `N.NM`, values of at least one
/// thousand as `N.NK`, other integers with `,` thousands separators and
/// other fractions with one decimal. The magnitude suffixes apply to
/// positive values only, so `-1500.0` renders as `-1,500`.
///
/// Rounding happens before the suffix is chosen, so `999.96` renders as
/// `1.0K` and `999_999.96` as `1.0M`.
#[must_use]
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return NO_DATA.to_string();
    }
    let value = round_tenths(value);
    let thousands = round_tenths(value / 1_000.0);
    if value >= 1_000_000.0 || thousands >= 1_000.0 {
        format!("{:.1}M", round_tenths(value / 1_000_000.0))
    } else if value >= 1_000.0 {
        format!("{thousands:.1}K")
    } else if value.fract() == 0.0 {
        #[allow(clippy::cast_possible_truncation)]
        group_thousands(value as i64)
    } else {
        format!("{value:.1}")
    }
}

/// Rounds to one decimal place. Negative zero becomes zero.
#[must_use]
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0 + 0.0
}

/// Formats a raw upstream value. Absent, null, empty, `"-"` and
/// non-numeric values render as [`NO_DATA`].
#[must_use]
pub fn format_raw(value: Option<&RawValue>) -> String {
    value
        .filter(|v| !v.is_no_data())
        .and_then(RawValue::as_number)
        .map_or_else(|| NO_DATA.to_string(), format_number)
}

/// Formats a percentage with one decimal, or [`NO_DATA`].
#[must_use]
pub fn format_percent(value: Option<f64>) -> String {
    value
        .filter(|p| p.is_finite())
        .map_or_else(|| NO_DATA.to_string(), |p| format!("{:.1}%", round_tenths(p)))
}

/// Renders an integer with `,` between each group of three digits.
#[must_use]
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn representative_values() {
        assert_eq!(format_raw(Some(&RawValue::from("0"))), "0");
        assert_eq!(format_raw(Some(&RawValue::from("950"))), "950");
        assert_eq!(format_raw(Some(&RawValue::from("1500"))), "1.5K");
        assert_eq!(format_raw(Some(&RawValue::from("2500000"))), "2.5M");
        assert_eq!(format_raw(Some(&RawValue::from("-"))), "N/A");
        assert_eq!(format_raw(Some(&RawValue::Null)), "N/A");
        assert_eq!(format_raw(None), "N/A");
    }

    #[test]
    fn empty_and_non_numeric_are_no_data() {
        assert_eq!(format_raw(Some(&RawValue::from(""))), "N/A");
        assert_eq!(format_raw(Some(&RawValue::from("abc"))), "N/A");
    }

    #[test]
    fn numeric_literals_format_like_strings() {
        assert_eq!(format_raw(Some(&RawValue::from(1500.0))), "1.5K");
        assert_eq!(format_raw(Some(&RawValue::from(12.34))), "12.3");
    }

    #[test]
    fn formatting_is_stable() {
        for input in ["0", "950", "1500", "2500000", "42.5"] {
            let once = format_raw(Some(&RawValue::from(input)));
            let parsed: f64 = input.parse().unwrap();
            assert_eq!(format_number(parsed), once);
        }
    }

    #[test]
    fn fractions_use_one_decimal() {
        assert_eq!(format_number(4.26), "4.3");
        assert_eq!(format_number(-3.74), "-3.7");
    }

    #[test]
    fn negatives_group_without_suffix() {
        assert_eq!(format_number(-1500.0), "-1,500");
        assert_eq!(format_number(-2_500_000.0), "-2,500,000");
        assert_eq!(format_number(-12.0), "-12");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(123_456_789), "123,456,789");
        assert_eq!(group_thousands(-45_000), "-45,000");
    }

    #[test]
    fn rounding_happens_before_the_suffix() {
        assert_eq!(format_number(999.96), "1.0K");
        assert_eq!(format_number(999_999.96), "1.0M");
        assert_eq!(format_number(999_960.0), "1.0M");
        assert_eq!(format_number(999.94), "999.9");
        assert_eq!(format_number(1_049.0), "1.0K");
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(format_number(-0.04), "0");
        assert_eq!(format_percent(Some(-0.04)), "0.0%");
        assert_eq!(format_percent(Some(-0.0)), "0.0%");
    }

    #[test]
    fn non_finite_is_no_data() {
        assert_eq!(format_number(f64::NAN), "N/A");
        assert_eq!(format_number(f64::INFINITY), "N/A");
    }

    #[test]
    fn percent() {
        assert_eq!(format_percent(Some(12.5)), "12.5%");
        assert_eq!(format_percent(Some(-3.0)), "-3.0%");
        assert_eq!(format_percent(None), "N/A");
    }
}
