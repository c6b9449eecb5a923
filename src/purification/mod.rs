// src/purification/mod.rs

//! Closed-form purification (entanglement pumping) protocols.
//!
//! Every function here is pure: it reads the current fidelity of the kept
//! `good` pair and the current error weights of the sacrificed `bad` pair
//! and returns a number. The caller performs the Bernoulli draw.
//!
//! The `good` pair is treated as a Werner state; any Bell-diagonal pair can
//! be twirled into one, so only its fidelity enters the formulas.
//!
//! Protocols 1 to 3 are two-to-one bilocal recurrence protocols. Protocol
//! `k` keeps error weight λk of the bad pair and measures out the other two
//! (λa, λb):
//!
//! ```text
//! p_k = (2(1 - 2λa - 2λb)F + (1 + λa + λb)) / 3
//! J_k = ((4λk + 3λa + 3λb - 3)F - λk) / ((4λa + 4λb - 2)F - λa - λb - 1)
//! ```
//!
//! PMD is a degenerate variant that is only defined when the bad pair
//! carries no λ2 or λ3 error.

use crate::core::{DecoheringResource, PurifyError};
use serde::Deserialize;
use std::fmt;

/// Denominators with a smaller magnitude are treated as singular.
const DENOMINATOR_EPSILON: f64 = 1e-12;

/// The purification protocols the node can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Keeps λ1, measures out λ2 and λ3.
    One,
    /// Keeps λ2, measures out λ3 and λ1.
    Two,
    /// Keeps λ3, measures out λ1 and λ2.
    Three,
    /// Werner-only variant; requires λ2 = λ3 = 0 on the bad pair.
    Pmd,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::One => write!(f, "PROT_1"),
            Protocol::Two => write!(f, "PROT_2"),
            Protocol::Three => write!(f, "PROT_3"),
            Protocol::Pmd => write!(f, "PMD"),
        }
    }
}

/// Success probability and post-success fidelity of one pumping attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PumpEstimate {
    /// Probability that the attempt succeeds.
    pub success_probability: f64,
    /// Fidelity of the kept pair if it does (the jump function).
    pub target_fidelity: f64,
}

/// Rejects non-finite values and values outside [0, 1].
fn check_unit_interval(value: f64, what: &str, protocol: Protocol) -> Result<f64, PurifyError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(PurifyError::domain(format!(
            "{} {} evaluated to {}, outside [0, 1]",
            protocol, what, value
        )));
    }
    Ok(value)
}

/// Splits the bad pair's current weights into (kept, measured_a, measured_b).
fn recurrence_weights(protocol: Protocol, bad: &DecoheringResource, now: f64) -> (f64, f64, f64) {
    let [l1, l2, l3] = bad.current_lambdas(now);
    match protocol {
        Protocol::One => (l1, l2, l3),
        Protocol::Two => (l2, l3, l1),
        Protocol::Three => (l3, l1, l2),
        // PMD never routes through the recurrence formulas
        Protocol::Pmd => (l1, l2, l3),
    }
}

fn recurrence_success_probability(
    protocol: Protocol,
    good: &DecoheringResource,
    bad: &DecoheringResource,
    now: f64,
) -> Result<f64, PurifyError> {
    let f = good.current_fidelity(now);
    let (_, a, b) = recurrence_weights(protocol, bad, now);
    let p = (2.0 * (1.0 - 2.0 * a - 2.0 * b) * f + (1.0 + a + b)) / 3.0;
    tracing::debug!(%protocol, success_probability = p, "evaluated success probability");
    check_unit_interval(p, "success probability", protocol)
}

fn recurrence_jump_function(
    protocol: Protocol,
    good: &DecoheringResource,
    bad: &DecoheringResource,
    now: f64,
) -> Result<f64, PurifyError> {
    let f = good.current_fidelity(now);
    let (k, a, b) = recurrence_weights(protocol, bad, now);
    let numerator = (4.0 * k + 3.0 * a + 3.0 * b - 3.0) * f - k;
    let denominator = (4.0 * a + 4.0 * b - 2.0) * f - a - b - 1.0;
    if denominator.abs() < DENOMINATOR_EPSILON {
        return Err(PurifyError::domain(format!(
            "{} jump function denominator vanished ({:e}) at F = {}",
            protocol, denominator, f
        )));
    }
    check_unit_interval(numerator / denominator, "jump function", protocol)
}

/// Success probability of protocol 1.
pub fn success_probability_1(good: &DecoheringResource, bad: &DecoheringResource, now: f64) -> Result<f64, PurifyError> {
    recurrence_success_probability(Protocol::One, good, bad, now)
}

/// Fidelity after a successful protocol 1 attempt.
pub fn jump_function_1(good: &DecoheringResource, bad: &DecoheringResource, now: f64) -> Result<f64, PurifyError> {
    recurrence_jump_function(Protocol::One, good, bad, now)
}

/// Success probability of protocol 2.
pub fn success_probability_2(good: &DecoheringResource, bad: &DecoheringResource, now: f64) -> Result<f64, PurifyError> {
    recurrence_success_probability(Protocol::Two, good, bad, now)
}

/// Fidelity after a successful protocol 2 attempt.
pub fn jump_function_2(good: &DecoheringResource, bad: &DecoheringResource, now: f64) -> Result<f64, PurifyError> {
    recurrence_jump_function(Protocol::Two, good, bad, now)
}

/// Success probability of protocol 3.
pub fn success_probability_3(good: &DecoheringResource, bad: &DecoheringResource, now: f64) -> Result<f64, PurifyError> {
    recurrence_success_probability(Protocol::Three, good, bad, now)
}

/// Fidelity after a successful protocol 3 attempt.
pub fn jump_function_3(good: &DecoheringResource, bad: &DecoheringResource, now: f64) -> Result<f64, PurifyError> {
    recurrence_jump_function(Protocol::Three, good, bad, now)
}

fn check_pmd_precondition(bad: &DecoheringResource, now: f64) -> Result<(), PurifyError> {
    let l2 = bad.current_lambda_2(now);
    let l3 = bad.current_lambda_3(now);
    if l2 != 0.0 || l3 != 0.0 {
        return Err(PurifyError::precondition(format!(
            "PMD requires λ2 = λ3 = 0 on the sacrificed pair, got λ2 = {}, λ3 = {}",
            l2, l3
        )));
    }
    Ok(())
}

/// Success probability of PMD: `Fg·Fb + (1 - Fg)(1 - Fb)`.
///
/// # Errors
/// `Precondition` if the bad pair carries λ2 or λ3 error.
pub fn pmd_success_probability(good: &DecoheringResource, bad: &DecoheringResource, now: f64) -> Result<f64, PurifyError> {
    check_pmd_precondition(bad, now)?;
    let fg = good.current_fidelity(now);
    let fb = bad.current_fidelity(now);
    let p = fg * fb + (1.0 - fg) * (1.0 - fb);
    tracing::debug!(protocol = %Protocol::Pmd, success_probability = p, "evaluated success probability");
    check_unit_interval(p, "success probability", Protocol::Pmd)
}

/// Fidelity after a successful PMD attempt: `Fg·Fb / p`.
///
/// # Errors
/// `Precondition` if the bad pair carries λ2 or λ3 error, `Domain` if the
/// success probability vanishes.
pub fn pmd_jump_function(good: &DecoheringResource, bad: &DecoheringResource, now: f64) -> Result<f64, PurifyError> {
    let p = pmd_success_probability(good, bad, now)?;
    if p.abs() < DENOMINATOR_EPSILON {
        return Err(PurifyError::domain(format!("PMD success probability vanished ({:e})", p)));
    }
    let fg = good.current_fidelity(now);
    let fb = bad.current_fidelity(now);
    check_unit_interval(fg * fb / p, "jump function", Protocol::Pmd)
}

/// Success probability of `protocol`.
pub fn success_probability(
    protocol: Protocol,
    good: &DecoheringResource,
    bad: &DecoheringResource,
    now: f64,
) -> Result<f64, PurifyError> {
    match protocol {
        Protocol::One => success_probability_1(good, bad, now),
        Protocol::Two => success_probability_2(good, bad, now),
        Protocol::Three => success_probability_3(good, bad, now),
        Protocol::Pmd => pmd_success_probability(good, bad, now),
    }
}

/// Jump function of `protocol`.
pub fn jump_function(
    protocol: Protocol,
    good: &DecoheringResource,
    bad: &DecoheringResource,
    now: f64,
) -> Result<f64, PurifyError> {
    match protocol {
        Protocol::One => jump_function_1(good, bad, now),
        Protocol::Two => jump_function_2(good, bad, now),
        Protocol::Three => jump_function_3(good, bad, now),
        Protocol::Pmd => pmd_jump_function(good, bad, now),
    }
}

/// Both halves of a pumping attempt at once.
pub fn estimate(
    protocol: Protocol,
    good: &DecoheringResource,
    bad: &DecoheringResource,
    now: f64,
) -> Result<PumpEstimate, PurifyError> {
    Ok(PumpEstimate {
        success_probability: success_probability(protocol, good, bad, now)?,
        target_fidelity: jump_function(protocol, good, bad, now)?,
    })
}
