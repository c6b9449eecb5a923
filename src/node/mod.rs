// src/node/mod.rs

//! The repeater memory node.
//!
//! A node holds at most two stored pairs and one pending request:
//!
//! * `good_slot` – the pair that will serve the next request,
//! * `bad_slot` – a single runner-up buffer, only occupied while `good_slot` is,
//! * `pending_request` – the local data qubit waiting for teleportation.
//!
//! The slots are exclusively owned options and are only mutated inside the
//! event handlers below. Stochastic misses come back as ordinary outcomes;
//! only contract violations are returned as errors.

pub mod action;

pub use action::{Action, PumpGate};

use crate::config::{LambdaStrategy, NodeConfig, UnservedRequestPolicy};
use crate::core::{DecoheringResource, PendingRequest, PurifyError, SimClock};
use crate::purification::{self, Protocol};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws `true` with probability `p`.
fn bernoulli(rng: &mut StdRng, p: f64) -> Result<bool, PurifyError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(PurifyError::domain(format!("probability must lie in [0, 1], got {}", p)));
    }
    Ok(rng.gen_bool(p))
}

/// One of the two storage slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The slot that serves requests.
    Good,
    /// The runner-up buffer.
    Bad,
}

/// Result of a pumping attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpOutcome {
    /// The good slot now holds a Werner pair at `fidelity`.
    Succeeded {
        /// Fidelity of the purified pair.
        fidelity: f64,
    },
    /// Both slots were emptied.
    Failed,
}

/// What an entanglement generation event did to the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GenerationOutcome {
    /// The attempt produced no pair.
    Failed,
    /// The pair went into an empty good slot; no action was applied.
    Stored,
    /// Replace put the pair into `slot`.
    Replaced(Slot),
    /// Replace found the pair no better than either slot and dropped it.
    Discarded,
    /// A pumping attempt ran.
    Pumped(PumpOutcome),
    /// The pumping coin came up tails; the pair was dropped.
    GateSkipped,
    /// Defer dropped the pair.
    Deferred,
}

/// What a request arrival did to the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    /// The request is now pending.
    Queued,
    /// A request was already pending; the arrival was dropped.
    Dropped,
}

/// How a pending request left the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Teleported over the good pair.
    Teleported,
    /// No pair was stored; recorded with zero fidelity.
    MemoryEmpty,
}

/// A completed service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceRecord {
    /// Fidelity of the delivered state.
    pub fidelity: f64,
    /// Time the request spent pending.
    pub waiting_time: f64,
    /// How the request was resolved.
    pub kind: ServiceKind,
}

impl ServiceRecord {
    /// The `(fidelity, waiting_time)` pair reported to collaborators.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.fidelity, self.waiting_time)
    }
}

/// Running counters of everything the node has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Entanglement attempts made.
    pub generation_attempts: u64,
    /// Attempts that produced a pair.
    pub generation_successes: u64,
    /// Pumping attempts carried out.
    pub purification_attempts: u64,
    /// Pumping attempts that succeeded.
    pub purification_successes: u64,
    /// Pumping attempts that emptied both slots.
    pub purification_failures: u64,
    /// Pump actions skipped by the pumping coin.
    pub gate_skips: u64,
    /// Fresh pairs dropped by `Defer`.
    pub deferrals: u64,
    /// Fresh pairs that displaced a stored one.
    pub replacements: u64,
    /// Request arrivals seen, dropped ones included.
    pub arrivals: u64,
    /// Arrivals dropped while a request was pending.
    pub dropped_arrivals: u64,
    /// Requests teleported over a stored pair.
    pub teleportations: u64,
    /// Requests recorded with zero fidelity from empty memory.
    pub empty_services: u64,
}

/// An event-driven repeater memory node.
#[derive(Debug, Clone)]
pub struct Node {
    config: NodeConfig,
    good_slot: Option<DecoheringResource>,
    bad_slot: Option<DecoheringResource>,
    pending_request: Option<PendingRequest>,
    rng: StdRng,
    stats: NodeStats,
}

impl Node {
    /// Creates an empty node drawing its coins from a generator seeded with
    /// `seed`.
    pub fn new(config: NodeConfig, seed: u64) -> Self {
        Self {
            config,
            good_slot: None,
            bad_slot: None,
            pending_request: None,
            rng: StdRng::seed_from_u64(seed),
            stats: NodeStats::default(),
        }
    }

    /// Parameters the node was built with.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The pair that serves the next request.
    pub fn good_slot(&self) -> Option<&DecoheringResource> {
        self.good_slot.as_ref()
    }

    /// The runner-up pair.
    pub fn bad_slot(&self) -> Option<&DecoheringResource> {
        self.bad_slot.as_ref()
    }

    /// The request waiting for service, if any.
    pub fn pending_request(&self) -> Option<&PendingRequest> {
        self.pending_request.as_ref()
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    /// Current fidelity of the good pair, 0 when the slot is empty.
    pub fn good_fidelity(&self, now: f64) -> f64 {
        self.good_slot.as_ref().map_or(0.0, |pair| pair.current_fidelity(now))
    }

    /// Current fidelity of the bad pair, 0 when the slot is empty.
    pub fn bad_fidelity(&self, now: f64) -> f64 {
        self.bad_slot.as_ref().map_or(0.0, |pair| pair.current_fidelity(now))
    }

    /// Handles a generation event, carrying out pump actions unconditionally.
    pub fn handle_entanglement_generated(
        &mut self,
        clock: &SimClock,
        action: Action,
    ) -> Result<GenerationOutcome, PurifyError> {
        self.handle_entanglement_generated_with_gate(clock, action, PumpGate::Always)
    }

    /// Handles a generation event, carrying out pump actions only when the
    /// pumping coin lands.
    pub fn handle_gated_entanglement_generated(
        &mut self,
        clock: &SimClock,
        action: Action,
    ) -> Result<GenerationOutcome, PurifyError> {
        self.handle_entanglement_generated_with_gate(clock, action, PumpGate::WithProbability)
    }

    /// Handles a generation event.
    ///
    /// # Arguments
    /// * `clock` - Supplies the current simulated time.
    /// * `action` - Applied to the new pair unless the good slot is empty.
    /// * `gate` - Whether pump actions face the extra pumping coin.
    ///
    /// # Errors
    /// * `Domain` if the configured strategy cannot build a pair or the
    ///   purification formulas leave their domain.
    /// * `Precondition` for PMD against a bad pair carrying λ2 or λ3.
    pub fn handle_entanglement_generated_with_gate(
        &mut self,
        clock: &SimClock,
        action: Action,
        gate: PumpGate,
    ) -> Result<GenerationOutcome, PurifyError> {
        let now = clock.current_time();
        let Some(candidate) = self.generate_entanglement(now)? else {
            return Ok(GenerationOutcome::Failed);
        };

        if self.good_slot.is_none() {
            tracing::debug!(time = now, pair = %candidate, "stored first pair");
            self.good_slot = Some(candidate);
            return Ok(GenerationOutcome::Stored);
        }

        match action {
            Action::Replace => Ok(self.replace(candidate, now)),
            Action::Defer => {
                self.stats.deferrals += 1;
                tracing::trace!(time = now, "deferred fresh pair");
                Ok(GenerationOutcome::Deferred)
            }
            Action::Protocol1 | Action::Protocol2 | Action::Protocol3 | Action::Pmd => {
                let protocol = match action.protocol() {
                    Some(protocol) => protocol,
                    None => return Err(PurifyError::invalid_state(format!("{} carries no protocol", action))),
                };
                if gate == PumpGate::WithProbability && !bernoulli(&mut self.rng, self.config.pumping_probability)? {
                    self.stats.gate_skips += 1;
                    tracing::trace!(time = now, %protocol, "pumping coin missed");
                    return Ok(GenerationOutcome::GateSkipped);
                }
                Ok(GenerationOutcome::Pumped(self.pump(candidate, protocol, now)?))
            }
        }
    }

    /// Runs one generation attempt and builds the pair per the configured
    /// strategy. `None` means the attempt failed.
    pub fn generate_entanglement(&mut self, now: f64) -> Result<Option<DecoheringResource>, PurifyError> {
        self.stats.generation_attempts += 1;
        if !bernoulli(&mut self.rng, self.config.generation_success_probability)? {
            return Ok(None);
        }
        self.stats.generation_successes += 1;

        let tau = self.config.decoherence_time;
        let pair = match self.config.lambda_strategy {
            LambdaStrategy::Fixed => DecoheringResource::from_lambdas(now, self.config.lambdas, tau)?,
            LambdaStrategy::DominantRandom => DecoheringResource::from_dominant_lambda(
                now,
                self.config.dominant_fidelity,
                self.config.lambdas[0],
                tau,
                &mut self.rng,
            )?,
            LambdaStrategy::UniformRandom => {
                DecoheringResource::from_fidelity_band(now, self.config.fidelity_band, tau, &mut self.rng)?
            }
        };
        Ok(Some(pair))
    }

    /// Keeps the better pairs.
    ///
    /// The candidate displaces the good pair if its current fidelity is
    /// strictly higher; otherwise it displaces the bad pair under the same
    /// comparison, or fills the bad slot if empty. A displaced good pair is
    /// discarded, not demoted.
    pub fn replace(&mut self, candidate: DecoheringResource, now: f64) -> GenerationOutcome {
        let fresh = candidate.current_fidelity(now);

        let Some(good) = self.good_slot.as_ref() else {
            self.good_slot = Some(candidate);
            return GenerationOutcome::Stored;
        };

        if fresh > good.current_fidelity(now) {
            tracing::debug!(time = now, fidelity = fresh, "replaced good pair");
            self.good_slot = Some(candidate);
            self.stats.replacements += 1;
            return GenerationOutcome::Replaced(Slot::Good);
        }

        let beats_bad = self.bad_slot.as_ref().map_or(true, |bad| fresh > bad.current_fidelity(now));
        if beats_bad {
            tracing::debug!(time = now, fidelity = fresh, "replaced bad pair");
            self.bad_slot = Some(candidate);
            self.stats.replacements += 1;
            GenerationOutcome::Replaced(Slot::Bad)
        } else {
            GenerationOutcome::Discarded
        }
    }

    /// Pumps the good pair with `candidate` as the sacrificed pair.
    ///
    /// On success the good slot becomes a fresh Werner pair at the jump
    /// fidelity and the bad slot is cleared. On failure both slots are
    /// cleared: the measurement consumes the kept pair as well.
    ///
    /// # Errors
    /// * `Precondition` if the good slot is empty, or for PMD against a
    ///   candidate carrying λ2 or λ3.
    /// * `Domain` if the formulas leave their domain.
    pub fn pump(
        &mut self,
        candidate: DecoheringResource,
        protocol: Protocol,
        now: f64,
    ) -> Result<PumpOutcome, PurifyError> {
        let good = self
            .good_slot
            .as_ref()
            .ok_or_else(|| PurifyError::precondition(format!("{} requested with an empty good slot", protocol)))?;

        let estimate = purification::estimate(protocol, good, &candidate, now)?;
        self.stats.purification_attempts += 1;

        if bernoulli(&mut self.rng, estimate.success_probability)? {
            let purified = DecoheringResource::from_fidelity(now, estimate.target_fidelity, self.config.decoherence_time)?;
            tracing::debug!(
                time = now,
                %protocol,
                fidelity = estimate.target_fidelity,
                "purification succeeded"
            );
            self.good_slot = Some(purified);
            self.bad_slot = None;
            self.stats.purification_successes += 1;
            Ok(PumpOutcome::Succeeded { fidelity: estimate.target_fidelity })
        } else {
            tracing::debug!(time = now, %protocol, p = estimate.success_probability, "purification failed");
            self.good_slot = None;
            self.bad_slot = None;
            self.stats.purification_failures += 1;
            Ok(PumpOutcome::Failed)
        }
    }

    /// Handles a request arrival. Capacity is one; later arrivals are
    /// dropped while a request is pending.
    pub fn handle_request_arrival(&mut self, clock: &SimClock) -> ArrivalOutcome {
        let now = clock.current_time();
        self.stats.arrivals += 1;
        if self.pending_request.is_some() {
            self.stats.dropped_arrivals += 1;
            tracing::debug!(time = now, "request dropped, one already pending");
            return ArrivalOutcome::Dropped;
        }
        self.pending_request = Some(PendingRequest::new(
            now,
            self.config.decoherence_time,
            self.config.waiting_time_sensitivity,
        ));
        tracing::trace!(time = now, "request queued");
        ArrivalOutcome::Queued
    }

    /// Serves the pending request if there is one.
    ///
    /// With a stored pair, teleports over the good pair, clears the request
    /// and the good slot, and promotes the bad pair. With empty memory the
    /// configured [`UnservedRequestPolicy`] decides.
    pub fn serve_request(&mut self, clock: &SimClock) -> Option<ServiceRecord> {
        let now = clock.current_time();
        let request = self.pending_request.as_ref()?;

        let Some(good) = self.good_slot.take() else {
            return match self.config.unserved_request {
                UnservedRequestPolicy::Wait => None,
                UnservedRequestPolicy::RecordZero => {
                    let waiting_time = request.waiting_time(now);
                    self.pending_request = None;
                    self.stats.empty_services += 1;
                    tracing::debug!(time = now, waiting_time, "request served from empty memory");
                    Some(ServiceRecord { fidelity: 0.0, waiting_time, kind: ServiceKind::MemoryEmpty })
                }
            };
        };

        let fidelity = request.teleportation_fidelity(good.current_fidelity(now), now);
        let waiting_time = request.waiting_time(now);
        self.pending_request = None;
        self.good_slot = self.bad_slot.take();
        self.stats.teleportations += 1;
        tracing::debug!(time = now, fidelity, waiting_time, "request teleported");

        Some(ServiceRecord { fidelity, waiting_time, kind: ServiceKind::Teleported })
    }
}
