// src/validation/mod.rs

//! Provides functions to validate Bell-diagonal weight sets and node slots.

use crate::core::constants::state_constants::NORM_TOLERANCE;
use crate::core::PurifyError;
use crate::node::Node;

/// Checks that `weights` sum to 1 within `tolerance`.
///
/// # Returns
/// * `Ok(())` if normalized.
/// * `Err(PurifyError::InvalidState)` otherwise.
pub fn check_normalization(weights: &[f64], tolerance: f64) -> Result<(), PurifyError> {
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > tolerance || !total.is_finite() {
        return Err(PurifyError::invalid_state(format!(
            "Bell-diagonal weights sum to {}, expected 1 (tolerance {:.1e})",
            total, tolerance
        )));
    }
    Ok(())
}

/// Validates a Bell-diagonal weight set `(F, λ1, λ2, λ3)`: every weight in
/// [0, 1] and the set normalized.
pub fn validate_weights(weights: &[f64; 4]) -> Result<(), PurifyError> {
    for (i, w) in weights.iter().enumerate() {
        if !(0.0..=1.0).contains(w) {
            return Err(PurifyError::invalid_state(format!(
                "weight {} = {} lies outside [0, 1]",
                i, w
            )));
        }
    }
    check_normalization(weights, NORM_TOLERANCE)
}

/// Checks the slot invariant of a node: an occupied `bad` slot implies an
/// occupied `good` slot.
pub fn check_node_invariant(node: &Node) -> Result<(), PurifyError> {
    if node.bad_slot().is_some() && node.good_slot().is_none() {
        return Err(PurifyError::invalid_state("bad slot occupied while good slot is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_weights_pass() {
        assert!(validate_weights(&[0.7, 0.3, 0.0, 0.0]).is_ok());
        assert!(validate_weights(&[0.25, 0.25, 0.25, 0.25]).is_ok());
    }

    #[test]
    fn test_unnormalized_weights_fail() {
        let result = validate_weights(&[0.7, 0.3, 0.1, 0.0]);
        assert!(matches!(result, Err(PurifyError::InvalidState { .. })));
    }

    #[test]
    fn test_out_of_range_weight_fails() {
        let result = validate_weights(&[1.2, -0.2, 0.0, 0.0]);
        assert!(matches!(result, Err(PurifyError::InvalidState { .. })));
    }

    #[test]
    fn test_custom_tolerance() {
        assert!(check_normalization(&[0.5, 0.5001], 1e-3).is_ok());
        assert!(check_normalization(&[0.5, 0.5001], 1e-6).is_err());
    }

    #[test]
    fn test_nan_weight_fails() {
        assert!(check_normalization(&[f64::NAN, 1.0], 1e-9).is_err());
    }
}
