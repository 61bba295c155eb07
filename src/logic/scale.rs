use crate::logic::AggregationError;

/// Scale a baseline ingredient amount to a requested serving count:
/// `amount * requested / baseline`. No rounding; full precision is carried
/// through to the output.
///
/// `baseline_portion == 0` cannot happen for well-formed data (the schema
/// requires a positive portion) and is rejected as a data-integrity error
/// rather than silently producing Infinity or NaN.
pub fn scale_amount(
    amount: f64,
    baseline_portion: i32,
    requested_portion: i32,
) -> Result<f64, AggregationError> {
    if baseline_portion == 0 {
        return Err(AggregationError::DataIntegrity(
            "dish baseline portion is zero".to_string(),
        ));
    }
    Ok(amount * f64::from(requested_portion) / f64::from(baseline_portion))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_proportionally() {
        assert_eq!(scale_amount(100.0, 2, 4).unwrap(), 200.0);
        assert_eq!(scale_amount(50.0, 2, 4).unwrap(), 100.0);
        assert_eq!(scale_amount(100.0, 4, 2).unwrap(), 50.0);
        assert_eq!(scale_amount(0.0, 3, 7).unwrap(), 0.0);
    }

    #[test]
    fn keeps_fractional_precision() {
        // 100 * 1 / 3 must not be rounded
        let scaled = scale_amount(100.0, 3, 1).unwrap();
        assert_eq!(scaled, 100.0 / 3.0);
    }

    #[test]
    fn identity_when_portions_match() {
        assert_eq!(scale_amount(42.5, 6, 6).unwrap(), 42.5);
    }

    #[test]
    fn zero_baseline_is_a_data_integrity_error() {
        let err = scale_amount(100.0, 0, 4).unwrap_err();
        assert!(matches!(err, AggregationError::DataIntegrity(_)));
    }
}
