//! Unit conversion for observation values.

use super::datetime::convert_to_days;

/// Converts `value` from `source` unit to `target` unit.
///
/// Supported: grams from kilograms, kilograms from grams, and days from a unitless duration
/// such as `27w3d`. Identical units pass the value through. Any other pair, or a non-numeric
/// mass, yields an empty string: no value is better than a wrong one.
pub fn convert(value: &str, source: &str, target: &str) -> String {
    if source == target {
        return value.to_string();
    }

    match (target, source) {
        ("g", "Kg") => scale(value, |x| x * 1000.0),
        ("Kg", "g") => scale(value, |x| x / 1000.0),
        ("days", "") => convert_to_days(value),
        _ => {
            tracing::debug!(value, source, target, "no unit conversion available");
            String::new()
        }
    }
}

fn scale(value: &str, f: impl Fn(f64) -> f64) -> String {
    match value.trim().parse::<f64>() {
        Ok(x) if x.is_finite() => format_number(f(x)),
        _ => String::new(),
    }
}

/// Shortest decimal representation, without a trailing `.0`.
fn format_number(x: f64) -> String {
    if x == x.trunc() && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        x.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_units_pass_through() {
        assert_eq!(convert("180", "mm", "mm"), "180");
        assert_eq!(convert("abc", "g", "g"), "abc");
    }

    #[test]
    fn converts_mass() {
        assert_eq!(convert("3.2", "Kg", "g"), "3200");
        assert_eq!(convert("1234", "g", "Kg"), "1.234");
        assert_eq!(convert("1500", "g", "Kg"), "1.5");
    }

    #[test]
    fn non_numeric_mass_is_dropped() {
        assert_eq!(convert("heavy", "Kg", "g"), "");
        assert_eq!(convert("", "g", "Kg"), "");
    }

    #[test]
    fn converts_unitless_duration_to_days() {
        assert_eq!(convert("27w3d", "", "days"), "192");
        assert_eq!(convert("192", "", "days"), "192");
    }

    #[test]
    fn unknown_pairs_yield_empty() {
        assert_eq!(convert("18", "cm", "mm"), "");
        assert_eq!(convert("27", "wk", "days"), "");
        assert_eq!(convert("3200", "lb", "g"), "");
    }
}
