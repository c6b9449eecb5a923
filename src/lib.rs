// src/lib.rs

//! `purify` - A discrete-event simulator of a quantum-repeater memory node
//!
//! The node generates noisy entangled pairs, optionally purifies them with
//! probabilistic recurrence protocols, and spends them to teleport arriving
//! requests. Every stored pair depolarizes with time; every run is
//! reproducible from its seed.

pub mod core;
pub mod purification;
pub mod node;
pub mod policy;
pub mod simulation;
pub mod validation;
pub mod config;

// Re-export the most common types for easier top-level use
pub use core::{
    teleportation_fidelity, ArrivalSchedule, DecoheringResource, Event, InterArrival, PendingRequest, PurifyError,
    SimClock,
};
pub use purification::{Protocol, PumpEstimate};
pub use node::{Action, GenerationOutcome, Node, NodeStats, PumpGate, PumpOutcome, ServiceKind, ServiceRecord};
pub use policy::{ActionSource, Observation, Policy, PolicyConfig, RandomAgent};
pub use simulation::{Simulation, SimulationReport, SlotSnapshot};
pub use validation::{check_node_invariant, check_normalization, validate_weights};
pub use config::{ConfigError, LambdaStrategy, NodeConfig, SimulationConfig, UnservedRequestPolicy};

// Example 1: Hand-driven node
// Two pure pairs arrive, a request follows and is teleported over the first
// pair while the second is promoted.
/// ```
/// use purify::{Action, Node, NodeConfig, PurifyError, SimClock};
///
/// let config = NodeConfig {
///     generation_success_probability: 1.0,
///     decoherence_time: f64::INFINITY,
///     lambdas: [0.0; 3],
///     ..NodeConfig::default()
/// };
/// let mut node = Node::new(config, 7);
///
/// // attempts at t = 1 and t = 2, a request at t = 2.5
/// let mut clock = SimClock::from_samples(vec![1.0, 1.0, 1.0], vec![2.5, 10.0]);
/// clock.update();
/// node.handle_entanglement_generated(&clock, Action::Replace)?;
/// clock.update();
/// node.handle_entanglement_generated(&clock, Action::Replace)?;
/// assert!(node.bad_slot().is_some());
///
/// clock.update();
/// node.handle_request_arrival(&clock);
/// let record = node.serve_request(&clock).expect("a pair was stored");
/// assert_eq!(record.as_tuple(), (1.0, 0.0));
/// assert!(node.good_slot().is_some());
/// assert!(node.bad_slot().is_none());
/// # Ok::<(), PurifyError>(())
/// ```
///
// Example 2: Configured run
/// ```
/// use purify::{Action, PolicyConfig, Simulation, SimulationConfig};
///
/// let mut config = SimulationConfig::sample(42, PolicyConfig::Fixed { action: Action::Protocol2 });
/// config.schedule.entanglement_count = 20_000;
/// config.schedule.request_count = 200;
///
/// let mut sim = Simulation::new(&config).expect("sample config is valid");
/// let report = sim.run().expect("run completes");
/// assert!(report.records.iter().all(|r| (0.0..=1.0).contains(&r.fidelity)));
/// assert!(report.records.iter().all(|r| r.waiting_time >= 0.0));
/// ```
#[doc(hidden)]
const _: () = ();
