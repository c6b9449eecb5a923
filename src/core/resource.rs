// src/core/resource.rs

//! Stored quantum resources and their noise models.
//!
//! A [`DecoheringResource`] is an entangled pair held in memory, described
//! by a Bell-diagonal weight set `(F, λ1, λ2, λ3)` at creation time. A
//! [`PendingRequest`] is the single local data qubit waiting to be
//! teleported. Neither stores a clock: the current simulated time is handed
//! in at query time and the current values are derived from it.

use crate::core::constants::state_constants::MIXED_FIDELITY;
use crate::core::PurifyError;
use crate::validation::validate_weights;
use rand::Rng;
use std::fmt;

/// Margin kept between a sampled dominant-λ split and its interval ends.
const SPLIT_MARGIN: f64 = 1e-4;

/// Exponential relaxation factor `e^{-elapsed/τ}`.
fn relaxation(elapsed: f64, decoherence_time: f64) -> f64 {
    (-elapsed / decoherence_time).exp()
}

/// An entangled pair held in memory that depolarizes over time.
///
/// The creation weights satisfy `F + λ1 + λ2 + λ3 = 1`, each in [0, 1].
/// Every weight relaxes toward the fully mixed point 0.25 with the same time
/// constant, so the current weights stay normalized at every age.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoheringResource {
    created_at: f64,
    fidelity: f64,
    lambdas: [f64; 3],
    decoherence_time: f64,
}

impl DecoheringResource {
    /// Builds a resource from explicit creation weights.
    pub fn new(created_at: f64, fidelity: f64, lambdas: [f64; 3], decoherence_time: f64) -> Result<Self, PurifyError> {
        if !(decoherence_time > 0.0) {
            return Err(PurifyError::domain(format!(
                "decoherence time must be positive, got {}",
                decoherence_time
            )));
        }
        validate_weights(&[fidelity, lambdas[0], lambdas[1], lambdas[2]])?;
        Ok(Self { created_at, fidelity, lambdas, decoherence_time })
    }

    /// Fixed-constants strategy: `F = 1 - (λ1 + λ2 + λ3)`.
    pub fn from_lambdas(created_at: f64, lambdas: [f64; 3], decoherence_time: f64) -> Result<Self, PurifyError> {
        let fidelity = 1.0 - (lambdas[0] + lambdas[1] + lambdas[2]);
        Self::new(created_at, fidelity, lambdas, decoherence_time)
    }

    /// Dominant-λ strategy: keeps `fidelity` and `lambda_1`, splits the rest
    /// uniformly into λ2 and λ3 such that `λ1 > λ2 + λ3`.
    ///
    /// # Errors
    /// `Domain` when no such split exists for the given pair.
    pub fn from_dominant_lambda<R: Rng>(
        created_at: f64,
        fidelity: f64,
        lambda_1: f64,
        decoherence_time: f64,
        rng: &mut R,
    ) -> Result<Self, PurifyError> {
        if !(fidelity > 0.0 && fidelity < 1.0) {
            return Err(PurifyError::domain(format!("fidelity must lie in (0, 1), got {}", fidelity)));
        }
        let remainder = (1.0 - fidelity) - lambda_1;
        if lambda_1 <= remainder {
            return Err(PurifyError::domain(format!(
                "λ1 = {} cannot dominate: λ2 + λ3 would be {}",
                lambda_1, remainder
            )));
        }
        if remainder <= 0.0 {
            return Err(PurifyError::domain(format!(
                "λ1 = {} leaves no positive mass for λ2 and λ3 at fidelity {}",
                lambda_1, fidelity
            )));
        }

        let lambda_2 = if remainder > 2.0 * SPLIT_MARGIN {
            rng.gen_range(SPLIT_MARGIN..remainder - SPLIT_MARGIN)
        } else {
            remainder / 2.0
        };
        let lambda_3 = remainder - lambda_2;
        tracing::debug!(lambda_2, lambda_3, "sampled dominant-λ split");

        Self::new(created_at, fidelity, [lambda_1, lambda_2, lambda_3], decoherence_time)
    }

    /// Uniform-random strategy: fidelity uniform in `[min, max]`, remaining
    /// mass cut at two uniform points into λ1, λ2, λ3.
    pub fn from_fidelity_band<R: Rng>(
        created_at: f64,
        band: [f64; 2],
        decoherence_time: f64,
        rng: &mut R,
    ) -> Result<Self, PurifyError> {
        let [min, max] = band;
        if !(0.0 <= min && min <= max && max <= 1.0) {
            return Err(PurifyError::domain(format!("invalid fidelity band [{}, {}]", min, max)));
        }

        let fidelity = if min < max { rng.gen_range(min..=max) } else { min };
        let remaining = 1.0 - fidelity;
        let (mut a, mut b) = if remaining > 0.0 {
            (rng.gen_range(0.0..=remaining), rng.gen_range(0.0..=remaining))
        } else {
            (0.0, 0.0)
        };
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }

        Self::new(created_at, fidelity, [a, b - a, remaining - b], decoherence_time)
    }

    /// Werner state: all three error weights equal to `(1 - F) / 3`.
    /// Materializes the result of a successful purification.
    pub fn from_fidelity(created_at: f64, fidelity: f64, decoherence_time: f64) -> Result<Self, PurifyError> {
        if !(0.0..=1.0).contains(&fidelity) {
            return Err(PurifyError::domain(format!("Werner fidelity must lie in [0, 1], got {}", fidelity)));
        }
        let lambda = (1.0 - fidelity) / 3.0;
        Self::new(created_at, fidelity, [lambda; 3], decoherence_time)
    }

    /// Simulated time at which this pair was stored.
    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    /// Fidelity at creation.
    pub fn creation_fidelity(&self) -> f64 {
        self.fidelity
    }

    /// Error weights at creation.
    pub fn creation_lambdas(&self) -> [f64; 3] {
        self.lambdas
    }

    /// Time constant τ of the depolarization.
    pub fn decoherence_time(&self) -> f64 {
        self.decoherence_time
    }

    fn decay(&self, now: f64) -> f64 {
        relaxation(now - self.created_at, self.decoherence_time)
    }

    /// `e^{-t/τ}(w0 - 0.25) + 0.25`; exactly `w0` before any decay.
    fn relax(weight: f64, decay: f64) -> f64 {
        if decay == 1.0 {
            return weight;
        }
        decay * (weight - MIXED_FIDELITY) + MIXED_FIDELITY
    }

    /// Fidelity at time `now`: `e^{-t/τ}(F0 - 0.25) + 0.25`.
    pub fn current_fidelity(&self, now: f64) -> f64 {
        Self::relax(self.fidelity, self.decay(now))
    }

    /// Error weight λ1 at time `now`.
    pub fn current_lambda_1(&self, now: f64) -> f64 {
        Self::relax(self.lambdas[0], self.decay(now))
    }

    /// Error weight λ2 at time `now`.
    pub fn current_lambda_2(&self, now: f64) -> f64 {
        Self::relax(self.lambdas[1], self.decay(now))
    }

    /// Error weight λ3 at time `now`.
    pub fn current_lambda_3(&self, now: f64) -> f64 {
        Self::relax(self.lambdas[2], self.decay(now))
    }

    /// All three error weights at time `now`.
    pub fn current_lambdas(&self, now: f64) -> [f64; 3] {
        let decay = self.decay(now);
        self.lambdas.map(|lambda| Self::relax(lambda, decay))
    }

    /// The full weight set `(F, λ1, λ2, λ3)` at time `now`.
    pub fn current_weights(&self, now: f64) -> [f64; 4] {
        let [l1, l2, l3] = self.current_lambdas(now);
        [self.current_fidelity(now), l1, l2, l3]
    }

    /// Whether the three creation error weights coincide.
    pub fn is_werner(&self) -> bool {
        self.lambdas[0] == self.lambdas[1] && self.lambdas[1] == self.lambdas[2]
    }
}

impl fmt::Display for DecoheringResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pair[t0={:.6}, F={:.4}, λ=({:.4}, {:.4}, {:.4})]",
            self.created_at, self.fidelity, self.lambdas[0], self.lambdas[1], self.lambdas[2]
        )
    }
}

/// Teleportation fidelity of a request qubit with fidelity `fq` sent over a
/// pair with fidelity `fe`: `(√((2Fe+1)Fq/3) - √(2(1-Fe)(1-Fq)/3))²`.
///
/// Inputs are clipped to [0, 1], both radicands are floored at zero and the
/// result is clipped to [0, 1].
pub fn teleportation_fidelity(fe: f64, fq: f64) -> f64 {
    let fe = fe.clamp(0.0, 1.0);
    let fq = fq.clamp(0.0, 1.0);

    let term1 = (2.0 * fe + 1.0) * fq / 3.0;
    let term2 = 2.0 * (1.0 - fe) * (1.0 - fq) / 3.0;

    let a = term1.max(0.0).sqrt();
    let b = term2.max(0.0).sqrt();

    ((a - b) * (a - b)).clamp(0.0, 1.0)
}

/// The local data qubit of a waiting teleportation request.
///
/// Its noise channel differs from a stored pair: fidelity relaxes toward
/// 2/3 as `(e^{-s·t/τ} + 2) / 3`, where `s` is the waiting-time
/// sensitivity.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    created_at: f64,
    decoherence_time: f64,
    waiting_time_sensitivity: f64,
}

impl PendingRequest {
    /// A request that arrived at `created_at`.
    pub fn new(created_at: f64, decoherence_time: f64, waiting_time_sensitivity: f64) -> Self {
        Self { created_at, decoherence_time, waiting_time_sensitivity }
    }

    /// Arrival time of the request.
    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    /// Fidelity of the data qubit at time `now`.
    pub fn current_fidelity(&self, now: f64) -> f64 {
        let elapsed = (now - self.created_at) * self.waiting_time_sensitivity;
        (relaxation(elapsed, self.decoherence_time) + 2.0) / 3.0
    }

    /// How long the request has been waiting at time `now`.
    pub fn waiting_time(&self, now: f64) -> f64 {
        now - self.created_at
    }

    /// Fidelity delivered when teleporting this request at `now` over a pair
    /// of fidelity `resource_fidelity`.
    pub fn teleportation_fidelity(&self, resource_fidelity: f64, now: f64) -> f64 {
        teleportation_fidelity(resource_fidelity, self.current_fidelity(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::state_constants::QUBIT_FIDELITY_FLOOR;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fidelity_at_creation_is_exact() -> Result<(), PurifyError> {
        let pair = DecoheringResource::from_lambdas(3.0, [0.3, 0.0, 0.0], 0.5)?;
        assert_eq!(pair.current_fidelity(3.0), pair.creation_fidelity());
        assert_eq!(pair.current_lambda_1(3.0), 0.3);
        assert_eq!(pair.current_lambda_2(3.0), 0.0);
        Ok(())
    }

    #[test]
    fn test_pair_relaxes_toward_mixed_point() -> Result<(), PurifyError> {
        let pair = DecoheringResource::from_fidelity(0.0, 0.95, 1.0)?;
        let late = pair.current_fidelity(50.0);
        assert_relative_eq!(late, 0.25, epsilon = 1e-12);
        assert_relative_eq!(pair.current_lambda_3(50.0), 0.25, epsilon = 1e-12);
        // one time constant in
        let f = pair.current_fidelity(1.0);
        assert_relative_eq!(f, 0.25 + 0.7 * (-1.0f64).exp(), epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_aged_weights_stay_normalized() -> Result<(), PurifyError> {
        let pair = DecoheringResource::from_lambdas(0.0, [0.3, 0.0, 0.0], 1.0)?;
        for t in [0.0, 0.1, 1.0, 5.0, 50.0] {
            validate_weights(&pair.current_weights(t))?;
        }
        // λ's that start at 0 grow toward the mixed point
        assert!(pair.current_lambda_2(5.0) > 0.24);
        assert_relative_eq!(pair.current_lambda_1(5.0), 0.25 + 0.05 * (-5.0f64).exp(), epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_werner_state_weights() -> Result<(), PurifyError> {
        let pair = DecoheringResource::from_fidelity(0.0, 0.7, 1.0)?;
        assert!(pair.is_werner());
        for lambda in pair.creation_lambdas() {
            assert_relative_eq!(lambda, 0.1, epsilon = 1e-15);
        }
        assert!(DecoheringResource::from_fidelity(0.0, 1.2, 1.0).is_err());
        Ok(())
    }

    #[test]
    fn test_dominant_lambda_split() -> Result<(), PurifyError> {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let pair = DecoheringResource::from_dominant_lambda(0.0, 0.7, 0.2, 1.0, &mut rng)?;
            let [l1, l2, l3] = pair.creation_lambdas();
            assert!(l1 > l2 + l3);
            assert!(l2 > 0.0 && l3 > 0.0);
            assert_relative_eq!(pair.creation_fidelity() + l1 + l2 + l3, 1.0, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_dominant_lambda_infeasible() {
        let mut rng = StdRng::seed_from_u64(11);
        // 1 - 0.7 = 0.3; λ1 = 0.1 leaves 0.2 for λ2 + λ3
        let result = DecoheringResource::from_dominant_lambda(0.0, 0.7, 0.1, 1.0, &mut rng);
        assert!(matches!(result, Err(PurifyError::Domain { .. })));
        // λ1 exceeds the whole error mass
        let result = DecoheringResource::from_dominant_lambda(0.0, 0.7, 0.35, 1.0, &mut rng);
        assert!(matches!(result, Err(PurifyError::Domain { .. })));
    }

    #[test]
    fn test_fidelity_band_sampling() -> Result<(), PurifyError> {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            let pair = DecoheringResource::from_fidelity_band(0.0, [0.6, 0.8], 1.0, &mut rng)?;
            let f = pair.creation_fidelity();
            assert!((0.6..=0.8).contains(&f));
            for lambda in pair.creation_lambdas() {
                assert!((0.0..=0.4).contains(&lambda));
            }
        }
        Ok(())
    }

    #[test]
    fn test_pending_request_floor() {
        let request = PendingRequest::new(1.0, 2.0, 1.0);
        assert_eq!(request.current_fidelity(1.0), 1.0);
        assert_relative_eq!(request.current_fidelity(1e6), QUBIT_FIDELITY_FLOOR, epsilon = 1e-12);
        assert_eq!(request.waiting_time(4.0), 3.0);
    }

    #[test]
    fn test_waiting_time_sensitivity_speeds_decay() {
        let slow = PendingRequest::new(0.0, 1.0, 1.0);
        let fast = PendingRequest::new(0.0, 1.0, 10.0);
        assert!(fast.current_fidelity(0.5) < slow.current_fidelity(0.5));
    }

    #[test]
    fn test_teleportation_with_perfect_inputs() {
        assert_eq!(teleportation_fidelity(1.0, 1.0), 1.0);
    }

    #[test]
    fn test_teleportation_over_mixed_pair_is_guess_floor() {
        assert_relative_eq!(teleportation_fidelity(0.25, 1.0), 0.5, epsilon = 1e-15);
        let fq: f64 = 0.9;
        assert_relative_eq!(
            teleportation_fidelity(0.25, fq),
            0.5 - (fq * (1.0 - fq)).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_teleportation_second_term_sign_regression() {
        // (1 - Fe) sign: term1 = 0.64, term2 = 0.04, (0.8 - 0.2)^2
        assert_relative_eq!(teleportation_fidelity(0.7, 0.8), 0.36, epsilon = 1e-12);
        // the (Fe - 1) variant would clamp term2 to zero and give 0.64
        assert!((teleportation_fidelity(0.7, 0.8) - 0.64).abs() > 0.1);
    }

    #[test]
    fn test_teleportation_clips_inputs() {
        assert_eq!(teleportation_fidelity(1.5, 1.0), 1.0);
        assert_relative_eq!(teleportation_fidelity(-0.2, 1.0), teleportation_fidelity(0.0, 1.0));
    }
}
