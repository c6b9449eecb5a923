// src/core/error.rs

//! Error handling logic

use thiserror::Error;

/// Error types raised by the repeater-node simulation.
///
/// Only contract violations and physically inconsistent inputs surface here.
/// Stochastic misses are ordinary outcomes and never become errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurifyError {
    /// A closed-form evaluation left its physical domain, e.g. a vanishing
    /// denominator or a probability outside [0, 1]. Aborts the current trial.
    #[error("Domain Violation: {message}")]
    Domain {
        /// Domain failure message
        message: String,
    },

    /// The API was used outside its contract, e.g. pumping without a primed
    /// memory or running PMD against a non-Werner-compatible ancilla.
    #[error("Precondition Violation: {message}")]
    Precondition {
        /// Precondition failure message
        message: String,
    },

    /// A stored state or the node slots are inconsistent
    /// (weights not normalized, `bad` occupied while `good` is empty).
    #[error("Invalid State: {message}")]
    InvalidState {
        /// InvalidState failure message
        message: String,
    },
}

impl PurifyError {
    pub(crate) fn domain(message: impl Into<String>) -> Self {
        PurifyError::Domain { message: message.into() }
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        PurifyError::Precondition { message: message.into() }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        PurifyError::InvalidState { message: message.into() }
    }
}
