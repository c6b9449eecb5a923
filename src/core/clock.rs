// src/core/clock.rs

//! The dual-process event clock.
//!
//! Two independent arrival processes run side by side: entanglement
//! attempts and request arrivals. Both inter-arrival sequences are drawn
//! once, up front, from a seeded source. Each [`SimClock::update`] fires
//! whichever process has the earlier next absolute time, the request process
//! on a tie; a run ends as soon as either sequence is used up.

use crate::core::constants::link_constants;
use crate::core::PurifyError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Gamma};
use serde::Deserialize;
use std::fmt;

/// The two event kinds the clock can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// An entanglement generation attempt took place.
    EntanglementGeneration,
    /// A teleportation request arrived at the node.
    RequestArrival,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::EntanglementGeneration => write!(f, "ENTANGLEMENT_GENERATION"),
            Event::RequestArrival => write!(f, "REQUEST_ARRIVAL"),
        }
    }
}

/// Distribution of the gaps between two consecutive arrivals of one process.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InterArrival {
    /// Every gap has the same length.
    Fixed {
        /// Gap length in seconds.
        interval: f64,
    },
    /// Memoryless arrivals.
    Exponential {
        /// Mean gap length in seconds.
        mean: f64,
    },
    /// Gamma-distributed gaps; heavier-tailed than a fixed cadence.
    Gamma {
        /// Shape parameter k.
        shape: f64,
        /// Scale parameter θ in seconds.
        scale: f64,
    },
}

impl InterArrival {
    /// Draws `count` gaps from this distribution.
    pub fn sample(&self, count: usize, rng: &mut StdRng) -> Result<Vec<f64>, PurifyError> {
        match *self {
            InterArrival::Fixed { interval } => {
                if !(interval > 0.0 && interval.is_finite()) {
                    return Err(PurifyError::domain(format!("fixed interval must be positive, got {}", interval)));
                }
                Ok(vec![interval; count])
            }
            InterArrival::Exponential { mean } => {
                if !(mean > 0.0 && mean.is_finite()) {
                    return Err(PurifyError::domain(format!("exponential mean must be positive, got {}", mean)));
                }
                let dist = Exp::new(1.0 / mean)
                    .map_err(|e| PurifyError::domain(format!("invalid exponential distribution: {}", e)))?;
                Ok(dist.sample_iter(rng).take(count).collect())
            }
            InterArrival::Gamma { shape, scale } => {
                let dist = Gamma::new(shape, scale)
                    .map_err(|e| PurifyError::domain(format!("invalid gamma distribution: {}", e)))?;
                Ok(dist.sample_iter(rng).take(count).collect())
            }
        }
    }
}

/// The pre-drawn sample budget of a run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArrivalSchedule {
    /// Gaps between entanglement attempts.
    pub entanglement: InterArrival,
    /// Number of entanglement attempts drawn.
    pub entanglement_count: usize,
    /// Gaps between request arrivals.
    pub request: InterArrival,
    /// Number of request arrivals drawn.
    pub request_count: usize,
}

impl Default for ArrivalSchedule {
    fn default() -> Self {
        let attempts = link_constants::ENTANGLEMENT_GENERATION_COUNT;
        Self {
            entanglement: InterArrival::Fixed { interval: link_constants::DELTA_T },
            entanglement_count: attempts,
            request: InterArrival::Gamma {
                shape: link_constants::REQUEST_GAMMA_SHAPE,
                scale: 1.0 / link_constants::QUBIT_ARRIVAL_SCALE,
            },
            request_count: (attempts as f64 / link_constants::QUBIT_ENTANGLEMENT_FACTOR).round() as usize,
        }
    }
}

/// Simulation clock advancing two independent arrival processes.
///
/// Both timestamps are non-decreasing and exactly one counter moves per
/// successful [`update`](SimClock::update).
#[derive(Debug, Clone)]
pub struct SimClock {
    entanglement_time: f64,
    entanglement_count: usize,
    request_time: f64,
    request_count: usize,
    last_fired: Option<Event>,
    entanglement_samples: Vec<f64>,
    request_samples: Vec<f64>,
}

impl SimClock {
    /// Draws both sample sequences from a generator seeded with `seed`.
    pub fn new(schedule: &ArrivalSchedule, seed: u64) -> Result<Self, PurifyError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let entanglement_samples = schedule.entanglement.sample(schedule.entanglement_count, &mut rng)?;
        let request_samples = schedule.request.sample(schedule.request_count, &mut rng)?;
        Ok(Self::from_samples(entanglement_samples, request_samples))
    }

    /// Builds a clock over explicit inter-arrival sequences.
    pub fn from_samples(entanglement_samples: Vec<f64>, request_samples: Vec<f64>) -> Self {
        Self {
            entanglement_time: 0.0,
            entanglement_count: 0,
            request_time: 0.0,
            request_count: 0,
            last_fired: None,
            entanglement_samples,
            request_samples,
        }
    }

    /// Fires the process with the earlier next time.
    ///
    /// Returns `false`, without moving, once either sequence is exhausted.
    pub fn update(&mut self) -> bool {
        if self.entanglement_count >= self.entanglement_samples.len()
            || self.request_count >= self.request_samples.len()
        {
            return false;
        }

        let next_entanglement = self.entanglement_time + self.entanglement_samples[self.entanglement_count];
        let next_request = self.request_time + self.request_samples[self.request_count];

        if next_entanglement < next_request {
            self.entanglement_time = next_entanglement;
            self.entanglement_count += 1;
            self.last_fired = Some(Event::EntanglementGeneration);
        } else {
            self.request_time = next_request;
            self.request_count += 1;
            self.last_fired = Some(Event::RequestArrival);
        }
        true
    }

    /// The process the latest [`update`](SimClock::update) fired.
    ///
    /// The fired process is recorded rather than read back from the
    /// timestamps, which coincide when an attempt lands on the latest
    /// request time. Before the first update the later timestamp decides,
    /// ties going to requests.
    pub fn last_event(&self) -> Event {
        match self.last_fired {
            Some(event) => event,
            None if self.entanglement_time > self.request_time => Event::EntanglementGeneration,
            None => Event::RequestArrival,
        }
    }

    /// Current simulated time, the later of the two timestamps.
    pub fn current_time(&self) -> f64 {
        self.entanglement_time.max(self.request_time)
    }

    /// Time of the latest entanglement attempt.
    pub fn entanglement_time(&self) -> f64 {
        self.entanglement_time
    }

    /// Number of entanglement attempts fired so far.
    pub fn entanglement_count(&self) -> usize {
        self.entanglement_count
    }

    /// Time of the latest request arrival.
    pub fn request_time(&self) -> f64 {
        self.request_time
    }

    /// Number of request arrivals fired so far.
    pub fn request_count(&self) -> usize {
        self.request_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_fires_earlier_process() {
        let mut clock = SimClock::from_samples(vec![1.0, 1.0, 1.0], vec![2.5, 10.0]);

        assert!(clock.update());
        assert_eq!(clock.last_event(), Event::EntanglementGeneration);
        assert_eq!(clock.current_time(), 1.0);

        assert!(clock.update());
        assert_eq!(clock.last_event(), Event::EntanglementGeneration);
        assert_eq!(clock.entanglement_count(), 2);

        assert!(clock.update());
        assert_eq!(clock.last_event(), Event::RequestArrival);
        assert_eq!(clock.request_count(), 1);
        assert_eq!(clock.current_time(), 2.5);
    }

    #[test]
    fn test_simultaneous_arrivals_go_to_request() {
        let mut clock = SimClock::from_samples(vec![2.0, 2.0], vec![2.0, 2.0]);
        assert!(clock.update());
        assert_eq!(clock.request_count(), 1);
        assert_eq!(clock.entanglement_count(), 0);
        assert_eq!(clock.last_event(), Event::RequestArrival);
    }

    #[test]
    fn test_attempt_on_request_timestamp_is_still_entanglement() {
        // attempts every 1 s, requests every 2 s: every request lands on an attempt
        let mut clock = SimClock::from_samples(vec![1.0; 10], vec![2.0; 3]);
        let mut fired = Vec::new();
        while clock.update() {
            fired.push((clock.last_event(), clock.current_time()));
        }
        use Event::{EntanglementGeneration as E, RequestArrival as R};
        assert_eq!(
            fired,
            vec![(E, 1.0), (R, 2.0), (E, 2.0), (E, 3.0), (R, 4.0), (E, 4.0), (E, 5.0), (R, 6.0)]
        );
        assert_eq!(clock.entanglement_count(), 5);
        assert_eq!(clock.request_count(), 3);
    }

    #[test]
    fn test_last_event_names_the_counter_that_moved() {
        let mut clock = SimClock::from_samples(vec![0.5, 1.5, 0.25, 3.0], vec![2.0, 2.0]);
        loop {
            let before = (clock.entanglement_count(), clock.request_count());
            if !clock.update() {
                break;
            }
            match clock.last_event() {
                Event::EntanglementGeneration => assert_eq!(clock.entanglement_count(), before.0 + 1),
                Event::RequestArrival => assert_eq!(clock.request_count(), before.1 + 1),
            }
        }
    }

    #[test]
    fn test_update_stops_when_any_sequence_is_exhausted() {
        let mut clock = SimClock::from_samples(vec![1.0], vec![5.0, 5.0]);
        assert!(clock.update());
        assert!(!clock.update());
        assert_eq!(clock.entanglement_count(), 1);
        assert_eq!(clock.request_count(), 0);
        assert_eq!(clock.current_time(), 1.0);
    }

    #[test]
    fn test_seeded_clocks_are_identical() -> Result<(), PurifyError> {
        let schedule = ArrivalSchedule {
            entanglement: InterArrival::Exponential { mean: 1.0 },
            entanglement_count: 200,
            request: InterArrival::Gamma { shape: 2.0, scale: 10.0 },
            request_count: 20,
        };
        let mut a = SimClock::new(&schedule, 7)?;
        let mut b = SimClock::new(&schedule, 7)?;
        while a.update() {
            assert!(b.update());
            assert_eq!(a.current_time(), b.current_time());
            assert_eq!(a.last_event(), b.last_event());
        }
        assert!(!b.update());
        Ok(())
    }

    #[test]
    fn test_default_schedule_budget() {
        let schedule = ArrivalSchedule::default();
        assert_eq!(schedule.entanglement_count, 300_000);
        assert_eq!(schedule.request_count, 3_000);
    }

    #[test]
    fn test_invalid_distribution_is_domain_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let gamma = InterArrival::Gamma { shape: -1.0, scale: 1.0 };
        assert!(matches!(gamma.sample(3, &mut rng), Err(PurifyError::Domain { .. })));
        let fixed = InterArrival::Fixed { interval: 0.0 };
        assert!(matches!(fixed.sample(3, &mut rng), Err(PurifyError::Domain { .. })));
    }
}
