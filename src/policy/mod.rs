// src/policy/mod.rs

//! Action selection for generation events.
//!
//! A [`Policy`] turns an [`Observation`] of the node into one [`Action`].
//! Fixed strategies, a random baseline agent and externally trained agents
//! all plug in here; the node never learns which one produced the action.

use crate::config::ConfigError;
use crate::node::{Action, PumpGate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::fmt;

/// What an agent sees before choosing an action.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Observation {
    /// Current fidelity of the good pair, 0 when empty.
    pub good_fidelity: f64,
    /// Current fidelity of the bad pair, 0 when empty.
    pub bad_fidelity: f64,
    /// Whether a request is pending.
    pub request_waiting: bool,
    /// Time elapsed since the latest request arrival.
    pub time_since_last_request: f64,
    /// Current simulated time.
    pub current_time: f64,
}

/// A source of actions driven from outside the crate, e.g. a trained policy
/// network.
pub trait ActionSource {
    /// Chooses the action for the next generation event.
    fn next_action(&mut self, observation: &Observation) -> Action;
}

impl<F> ActionSource for F
where
    F: FnMut(&Observation) -> Action,
{
    fn next_action(&mut self, observation: &Observation) -> Action {
        self(observation)
    }
}

/// The active action-selection policy.
pub enum Policy {
    /// Always the same action.
    Fixed(Action),
    /// Always the same action, with pump actions gated by the pumping coin.
    ProbabilityGated(Action),
    /// Uniformly random choice over a non-empty action list.
    UniformRandom(RandomAgent),
    /// Delegates to an external source.
    External(Box<dyn ActionSource>),
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Fixed(action) => f.debug_tuple("Fixed").field(action).finish(),
            Policy::ProbabilityGated(action) => f.debug_tuple("ProbabilityGated").field(action).finish(),
            Policy::UniformRandom(agent) => f.debug_tuple("UniformRandom").field(agent).finish(),
            Policy::External(_) => f.write_str("External(..)"),
        }
    }
}

impl Policy {
    /// Builds a policy from its configuration; random choices are seeded
    /// with `seed`.
    pub fn from_config(config: &PolicyConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(match config {
            PolicyConfig::Fixed { action } => Policy::Fixed(*action),
            PolicyConfig::ProbabilityGated { action } => Policy::ProbabilityGated(*action),
            PolicyConfig::UniformRandom { actions } => Policy::uniform_random(actions.clone(), seed)?,
        })
    }

    /// Builds the random baseline agent.
    ///
    /// # Errors
    /// `ConfigError::Validation` if `actions` is empty.
    pub fn uniform_random(actions: Vec<Action>, seed: u64) -> Result<Self, ConfigError> {
        if actions.is_empty() {
            return Err(ConfigError::Validation(
                "uniform-random policy needs at least one action".to_string(),
            ));
        }
        Ok(Policy::UniformRandom(RandomAgent {
            actions,
            rng: StdRng::seed_from_u64(seed),
        }))
    }

    /// Wraps an external action source.
    pub fn external(source: impl ActionSource + 'static) -> Self {
        Policy::External(Box::new(source))
    }

    /// Chooses the action for the next generation event.
    pub fn decide(&mut self, observation: &Observation) -> Action {
        match self {
            Policy::Fixed(action) | Policy::ProbabilityGated(action) => *action,
            Policy::UniformRandom(agent) => agent.choose(),
            Policy::External(source) => source.next_action(observation),
        }
    }

    /// Whether pump actions chosen by this policy face the pumping coin.
    pub fn pump_gate(&self) -> PumpGate {
        match self {
            Policy::ProbabilityGated(_) => PumpGate::WithProbability,
            _ => PumpGate::Always,
        }
    }
}

/// Seeded uniform choice over a fixed action list.
pub struct RandomAgent {
    actions: Vec<Action>,
    rng: StdRng,
}

impl RandomAgent {
    /// The actions this agent picks from.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    fn choose(&mut self) -> Action {
        self.actions[self.rng.gen_range(0..self.actions.len())]
    }
}

impl fmt::Debug for RandomAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomAgent").field("actions", &self.actions).finish_non_exhaustive()
    }
}

/// Serializable description of a [`Policy`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PolicyConfig {
    Fixed { action: Action },
    ProbabilityGated { action: Action },
    UniformRandom { actions: Vec<Action> },
}

impl PolicyConfig {
    /// Rejects a random policy with nothing to choose from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            PolicyConfig::UniformRandom { actions } if actions.is_empty() => Err(ConfigError::Validation(
                "uniform-random policy needs at least one action".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
