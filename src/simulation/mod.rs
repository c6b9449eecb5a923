// src/simulation/mod.rs

//! Drives one repeater node through a bounded, reproducible run.
//!
//! A [`Simulation`] owns one [`SimClock`], one [`Node`] and one [`Policy`].
//! Each [`step`](Simulation::step) fires the next clock event, routes it to
//! the node, asks the node to serve its pending request and checks the slot
//! invariant. Nothing is shared between simulations, so independently
//! seeded runs can go to separate threads without synchronization.

mod results;

pub use crate::node::ServiceRecord;
pub use results::{SimulationReport, SlotSnapshot};

use crate::config::{ConfigError, SimulationConfig};
use crate::core::{Event, PurifyError, SimClock};
use crate::node::{Action, ArrivalOutcome, Node};
use crate::policy::{Observation, Policy};
use crate::validation::check_node_invariant;

/// Seed offsets that keep the clock, node and policy streams independent.
const NODE_STREAM: u64 = 1;
const POLICY_STREAM: u64 = 2;

/// A single-node discrete-event simulation.
#[derive(Debug)]
pub struct Simulation {
    clock: SimClock,
    node: Node,
    policy: Policy,
    records: Vec<ServiceRecord>,
    snapshots: Vec<SlotSnapshot>,
    record_snapshots: bool,
    dropped_requests: u64,
}

impl Simulation {
    /// Builds a run from a configuration: draws the arrival schedule,
    /// creates an empty node and instantiates the policy.
    ///
    /// # Errors
    /// `ConfigError::Validation` if the configuration describes an
    /// impossible run.
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock = SimClock::new(&config.schedule, config.seed)
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        let node = Node::new(config.node.clone(), config.seed.wrapping_add(NODE_STREAM));
        let policy = Policy::from_config(&config.policy, config.seed.wrapping_add(POLICY_STREAM))?;
        tracing::info!(
            seed = config.seed,
            entanglement_attempts = config.schedule.entanglement_count,
            requests = config.schedule.request_count,
            "simulation prepared"
        );
        Ok(Self::from_parts(clock, node, policy).with_snapshots(config.record_snapshots))
    }

    /// Assembles a run from ready-made parts.
    pub fn from_parts(clock: SimClock, node: Node, policy: Policy) -> Self {
        Self {
            clock,
            node,
            policy,
            records: Vec::new(),
            snapshots: Vec::new(),
            record_snapshots: false,
            dropped_requests: 0,
        }
    }

    /// Enables or disables per-step slot snapshots.
    pub fn with_snapshots(mut self, record_snapshots: bool) -> Self {
        self.record_snapshots = record_snapshots;
        self
    }

    /// Swaps in another policy, e.g. an external agent.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// The event clock of this run.
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The simulated node.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Services completed so far.
    pub fn records(&self) -> &[ServiceRecord] {
        &self.records
    }

    /// What an agent sees right now.
    pub fn observation(&self) -> Observation {
        let now = self.clock.current_time();
        Observation {
            good_fidelity: self.node.good_fidelity(now),
            bad_fidelity: self.node.bad_fidelity(now),
            request_waiting: self.node.pending_request().is_some(),
            time_since_last_request: now - self.clock.request_time(),
            current_time: now,
        }
    }

    /// Advances by one event, choosing the action with the policy.
    ///
    /// # Returns
    /// * `Ok(false)` once the arrival schedule is exhausted.
    /// * `Ok(true)` after handling one event.
    ///
    /// # Errors
    /// Any `Domain`, `Precondition` or `InvalidState` error raised while
    /// handling the event. The run should be abandoned.
    pub fn step(&mut self) -> Result<bool, PurifyError> {
        self.advance(None)
    }

    /// Advances by one event, applying `action` if it is a generation event.
    pub fn step_with(&mut self, action: Action) -> Result<bool, PurifyError> {
        self.advance(Some(action))
    }

    fn advance(&mut self, supplied: Option<Action>) -> Result<bool, PurifyError> {
        if !self.clock.update() {
            return Ok(false);
        }

        let event = self.clock.last_event();
        match event {
            Event::EntanglementGeneration => {
                let action = match supplied {
                    Some(action) => action,
                    None => {
                        let observation = self.observation();
                        self.policy.decide(&observation)
                    }
                };
                let gate = self.policy.pump_gate();
                let outcome = self.node.handle_entanglement_generated_with_gate(&self.clock, action, gate)?;
                tracing::trace!(time = self.clock.current_time(), %action, ?outcome, "generation event");
            }
            Event::RequestArrival => {
                if self.node.handle_request_arrival(&self.clock) == ArrivalOutcome::Dropped {
                    self.dropped_requests += 1;
                }
            }
        }

        if let Some(record) = self.node.serve_request(&self.clock) {
            self.records.push(record);
        }
        check_node_invariant(&self.node)?;

        if self.record_snapshots {
            let now = self.clock.current_time();
            self.snapshots.push(SlotSnapshot {
                time: now,
                event,
                good: self.node.good_slot().map(|pair| pair.current_fidelity(now)),
                bad: self.node.bad_slot().map(|pair| pair.current_fidelity(now)),
                request_waiting: self.node.pending_request().is_some(),
            });
        }
        Ok(true)
    }

    /// Steps until the schedule is exhausted and reports the outcome.
    pub fn run(&mut self) -> Result<SimulationReport, PurifyError> {
        while self.step()? {}
        let report = self.report();
        tracing::info!(
            services = report.records.len(),
            teleported = report.served_count(),
            dropped = report.dropped_requests,
            mean_fidelity = report.mean_fidelity().unwrap_or(0.0),
            "simulation finished"
        );
        Ok(report)
    }

    /// A report of everything recorded so far.
    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            records: self.records.clone(),
            snapshots: self.snapshots.clone(),
            stats: *self.node.stats(),
            dropped_requests: self.dropped_requests,
        }
    }
}
