// src/node/action.rs

//! The closed set of actions a node accepts per generation event.

use crate::purification::Protocol;
use serde::Deserialize;
use std::fmt;

/// What to do with a freshly generated pair once the good slot is primed.
///
/// The same hook serves fixed strategies and externally trained agents; the
/// node never asks how an action was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Keep the better pairs: the candidate displaces the good slot, or else
    /// the bad slot, if its current fidelity is strictly higher.
    Replace,
    /// Pump the good pair with the candidate using protocol 1.
    Protocol1,
    /// Pump the good pair with the candidate using protocol 2.
    Protocol2,
    /// Pump the good pair with the candidate using protocol 3.
    Protocol3,
    /// Pump the good pair with the candidate using PMD.
    Pmd,
    /// Discard the candidate and leave both slots untouched.
    Defer,
}

impl Action {
    /// Every action, in index order.
    pub const ALL: [Action; 6] = [
        Action::Replace,
        Action::Protocol1,
        Action::Protocol2,
        Action::Protocol3,
        Action::Pmd,
        Action::Defer,
    ];

    /// The purification protocol behind a pump action.
    pub fn protocol(&self) -> Option<Protocol> {
        match self {
            Action::Protocol1 => Some(Protocol::One),
            Action::Protocol2 => Some(Protocol::Two),
            Action::Protocol3 => Some(Protocol::Three),
            Action::Pmd => Some(Protocol::Pmd),
            Action::Replace | Action::Defer => None,
        }
    }

    /// Maps a discrete agent output onto an action.
    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    /// Position of this action in [`Action::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Action::Replace => 0,
            Action::Protocol1 => 1,
            Action::Protocol2 => 2,
            Action::Protocol3 => 3,
            Action::Pmd => 4,
            Action::Defer => 5,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.protocol() {
            Some(protocol) => write!(f, "{}", protocol),
            None if *self == Action::Replace => write!(f, "REPLACE"),
            None => write!(f, "DEFER"),
        }
    }
}

/// Whether a pump attempt is itself gated by an extra coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PumpGate {
    /// Every pump action is carried out.
    #[default]
    Always,
    /// A pump action is carried out with the configured pumping probability.
    WithProbability,
}
