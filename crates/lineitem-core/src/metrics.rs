//! Derived ratios

/// Influenced ROAS: transaction amount over spend.
///
/// Undefined (`None`) when spend is missing, zero or negative.
pub fn influenced_roas(amount: f64, spend: Option<f64>) -> Option<f64> {
    match spend {
        Some(spend) if spend.is_finite() && spend > 0.0 => Some(amount / spend),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roas_defined_for_positive_spend() {
        assert_eq!(influenced_roas(150.0, Some(50.0)), Some(3.0));
        assert_eq!(influenced_roas(0.0, Some(10.0)), Some(0.0));
    }

    #[test]
    fn test_roas_undefined_without_positive_spend() {
        assert_eq!(influenced_roas(150.0, None), None);
        assert_eq!(influenced_roas(150.0, Some(0.0)), None);
        assert_eq!(influenced_roas(150.0, Some(-5.0)), None);
        assert_eq!(influenced_roas(150.0, Some(f64::NAN)), None);
    }
}
