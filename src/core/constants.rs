// src/core/constants.rs

//! Reference physical constants for the simulated repeater link.

/// Constants of the reference link: a 20 km fibre segment driven at one
/// entanglement attempt per light-travel time.
pub mod link_constants {
    /// Fibre length in metres.
    pub const LENGTH: f64 = 20_000.0;
    /// Signal speed in fibre, metres per second.
    pub const SIGNAL_SPEED: f64 = 2e8;
    /// Time between two entanglement attempts, in seconds.
    pub const DELTA_T: f64 = LENGTH / SIGNAL_SPEED;
    /// Success probability of a single entanglement attempt.
    pub const P_G: f64 = 0.3047;
    /// Fibre attenuation in dB per metre.
    pub const ETA: f64 = -0.00015;
    /// Number of entanglement attempts in a reference run.
    pub const ENTANGLEMENT_GENERATION_COUNT: usize = 300_000;
    /// Entanglement attempts per request arrival, on average.
    pub const QUBIT_ENTANGLEMENT_FACTOR: f64 = 100.0;
    /// Rate parameter of the request arrival process.
    pub const QUBIT_ARRIVAL_SCALE: f64 = P_G / (QUBIT_ENTANGLEMENT_FACTOR * DELTA_T);
    /// Shape of the Gamma-distributed request inter-arrival times.
    pub const REQUEST_GAMMA_SHAPE: f64 = 2.0;
}

/// Constants describing freshly generated Bell-diagonal states.
pub mod state_constants {
    /// Default error weights (λ1, λ2, λ3) for the fixed-constants strategy.
    pub const LAMBDAS: [f64; 3] = [0.3, 0.0, 0.0];
    /// Creation fidelity used by the dominant-λ strategy.
    pub const DOMINANT_FIDELITY: f64 = 0.7;
    /// Fidelity band sampled by the uniform-random strategy.
    pub const FIDELITY_BAND: [f64; 2] = [0.6, 0.8];
    /// Fixed point of a depolarizing Bell-diagonal pair.
    pub const MIXED_FIDELITY: f64 = 0.25;
    /// Fixed point of a depolarizing single data qubit.
    pub const QUBIT_FIDELITY_FLOOR: f64 = 2.0 / 3.0;
    /// Tolerance for the normalization check of a weight set.
    pub const NORM_TOLERANCE: f64 = 1e-9;
}

/// Converts a gain in decibels into a linear factor.
pub fn decibel_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// Converts a linear factor into decibels; non-positive inputs map to -inf.
pub fn linear_to_decibel(value: f64) -> f64 {
    if value <= 0.0 {
        return f64::NEG_INFINITY;
    }
    10.0 * value.log10()
}

/// Probability that a photon survives `length` metres of fibre with
/// attenuation `eta_db_per_m`.
pub fn generation_probability_from_attenuation(eta_db_per_m: f64, length: f64) -> f64 {
    decibel_to_linear(eta_db_per_m * length)
}
