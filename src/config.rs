// src/config.rs

//! Run configuration: node physics, arrival schedule and action policy.
//!
//! Every section deserializes from TOML with kebab-case keys and falls back
//! to the reference link constants for anything left out.

use crate::core::constants::{link_constants, state_constants};
use crate::core::{ArrivalSchedule, InterArrival};
use crate::node::Action;
use crate::policy::PolicyConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("unable to read config {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`SimulationConfig`].
    #[error("failed to parse config: {details}")]
    Parse {
        /// Parser diagnostics.
        details: String,
    },
    /// The values parsed but describe an impossible run.
    #[error("configuration invalid: {0}")]
    Validation(String),
}

/// How a freshly generated pair picks its Bell-diagonal weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LambdaStrategy {
    /// `F = 1 - Σλ` for the configured λ's.
    #[default]
    Fixed,
    /// Configured λ1 dominates; λ2, λ3 split the rest at random.
    DominantRandom,
    /// Fidelity uniform in the configured band; λ's cut the rest at random.
    UniformRandom,
}

/// What `serve_request` does when a request waits but memory is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnservedRequestPolicy {
    /// Keep the request pending and report nothing.
    #[default]
    Wait,
    /// Report a zero-fidelity service and discard the request.
    RecordZero,
}

/// Physical and behavioural parameters of the memory node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NodeConfig {
    /// Probability that an entanglement attempt yields a pair.
    pub generation_success_probability: f64,
    /// Time constant τ of the memory depolarization, in seconds.
    pub decoherence_time: f64,
    /// Probability that a gated pump attempt is carried out at all.
    pub pumping_probability: f64,
    /// Scale applied to a request's waiting time before decay.
    pub waiting_time_sensitivity: f64,
    /// Initial-state generation strategy.
    pub lambda_strategy: LambdaStrategy,
    /// Error weights (λ1, λ2, λ3) for the fixed and dominant strategies.
    pub lambdas: [f64; 3],
    /// Creation fidelity of the dominant-λ strategy.
    pub dominant_fidelity: f64,
    /// Fidelity band of the uniform-random strategy.
    pub fidelity_band: [f64; 2],
    /// Handling of requests that find the memory empty.
    pub unserved_request: UnservedRequestPolicy,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            generation_success_probability: link_constants::P_G,
            decoherence_time: 1e-3,
            pumping_probability: 1.0,
            waiting_time_sensitivity: 1.0,
            lambda_strategy: LambdaStrategy::default(),
            lambdas: state_constants::LAMBDAS,
            dominant_fidelity: state_constants::DOMINANT_FIDELITY,
            fidelity_band: state_constants::FIDELITY_BAND,
            unserved_request: UnservedRequestPolicy::default(),
        }
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!("{} must lie in [0, 1], got {}", name, value)));
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    // NaN fails this comparison as well
    if !(value > 0.0) {
        return Err(ConfigError::Validation(format!("{} must be positive, got {}", name, value)));
    }
    Ok(())
}

fn check_inter_arrival(name: &str, inter_arrival: &InterArrival) -> Result<(), ConfigError> {
    match *inter_arrival {
        InterArrival::Fixed { interval } => check_positive(&format!("{} interval", name), interval),
        InterArrival::Exponential { mean } => check_positive(&format!("{} mean", name), mean),
        InterArrival::Gamma { shape, scale } => {
            check_positive(&format!("{} shape", name), shape)?;
            check_positive(&format!("{} scale", name), scale)
        }
    }
}

impl NodeConfig {
    /// Rejects parameter sets no node can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("generation-success-probability", self.generation_success_probability)?;
        check_probability("pumping-probability", self.pumping_probability)?;
        check_positive("decoherence-time", self.decoherence_time)?;
        check_positive("waiting-time-sensitivity", self.waiting_time_sensitivity)?;

        for (i, lambda) in self.lambdas.iter().enumerate() {
            check_probability(&format!("lambdas[{}]", i), *lambda)?;
        }
        let lambda_sum: f64 = self.lambdas.iter().sum();
        if lambda_sum > 1.0 + state_constants::NORM_TOLERANCE {
            return Err(ConfigError::Validation(format!("lambdas sum to {}, more than 1", lambda_sum)));
        }

        check_probability("dominant-fidelity", self.dominant_fidelity)?;
        let [min, max] = self.fidelity_band;
        check_probability("fidelity-band[0]", min)?;
        check_probability("fidelity-band[1]", max)?;
        if min > max {
            return Err(ConfigError::Validation(format!("fidelity band [{}, {}] is inverted", min, max)));
        }
        Ok(())
    }
}

/// A complete, reproducible simulation run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SimulationConfig {
    /// Seed of every random stream in the run.
    pub seed: u64,
    /// Node parameters.
    pub node: NodeConfig,
    /// Pre-drawn arrival budget.
    pub schedule: ArrivalSchedule,
    /// Action selection for generation events.
    pub policy: PolicyConfig,
    /// Keep a per-step slot snapshot in the report.
    pub record_snapshots: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            node: NodeConfig::default(),
            schedule: ArrivalSchedule::default(),
            policy: PolicyConfig::Fixed { action: Action::Replace },
            record_snapshots: false,
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|err| ConfigError::Parse { details: err.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.node.validate()?;
        check_inter_arrival("entanglement", &self.schedule.entanglement)?;
        check_inter_arrival("request", &self.schedule.request)?;
        self.policy.validate()
    }

    /// The reference configuration with the given seed and policy.
    pub fn sample(seed: u64, policy: PolicyConfig) -> Self {
        Self { seed, policy, ..Self::default() }
    }
}
