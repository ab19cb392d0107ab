//! Parsing of controller stdout.
//!
//! The controller prints diagnostics followed by a final `<label>: <number>%`
//! line; only the last non-empty line is authoritative.

use crate::invoke::InvocationError;

const DELIMITER: &str = ": ";

/// Extract the reading from captured controller output.
pub fn parse_output(output: &str) -> Result<f64, InvocationError> {
    let Some(last) = output.lines().rev().find(|l| !l.trim().is_empty()) else {
        return Err(InvocationError::MalformedOutput {
            reason: "no output lines",
            output: output.to_string(),
        });
    };

    let Some((_, rest)) = last.split_once(DELIMITER) else {
        return Err(InvocationError::MalformedOutput {
            reason: "missing \": \" delimiter",
            output: output.to_string(),
        });
    };

    let rest = rest.trim();
    let number = rest.strip_suffix('%').unwrap_or(rest).trim();

    match number.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(InvocationError::UnparsableValue {
            value: number.to_string(),
            output: output.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fan_speed_line() {
        assert_eq!(parse_output("Fan speed: 73.50%").unwrap(), 73.5);
    }

    #[test]
    fn uses_last_non_empty_line() {
        let out = "Temperature 25.000 degC\nFan speed: 10.00%\n\nFan speed: 42.00%\r\n\n  \n";
        assert_eq!(parse_output(out).unwrap(), 42.0);
    }

    #[test]
    fn splits_on_first_delimiter_only() {
        // Everything after the first ": " is the value.
        let err = parse_output("a: b: 3%").unwrap_err();
        assert!(matches!(err, InvocationError::UnparsableValue { ref value, .. } if value == "b: 3"));
    }

    #[test]
    fn percent_sign_is_optional() {
        assert_eq!(parse_output("Fan speed: -0.125").unwrap(), -0.125);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = parse_output("garbage").unwrap_err();
        assert!(matches!(err, InvocationError::MalformedOutput { .. }));
        assert_eq!(err.raw_output(), "garbage");
    }

    #[test]
    fn empty_output_is_malformed() {
        assert!(matches!(
            parse_output("\n \n").unwrap_err(),
            InvocationError::MalformedOutput { reason: "no output lines", .. }
        ));
    }

    #[test]
    fn non_numeric_and_nan_are_unparsable() {
        assert!(matches!(
            parse_output("Fan speed: fast%").unwrap_err(),
            InvocationError::UnparsableValue { .. }
        ));
        assert!(matches!(
            parse_output("Fan speed: nan%").unwrap_err(),
            InvocationError::UnparsableValue { .. }
        ));
        assert!(matches!(
            parse_output("Fan speed: inf%").unwrap_err(),
            InvocationError::UnparsableValue { .. }
        ));
    }
}
