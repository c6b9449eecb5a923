// tests/simulation_tests.rs

// Import necessary types from the purify crate
use purify::{
    Action, ConfigError, Node, NodeConfig, Observation, Policy, PolicyConfig, PurifyError, ServiceKind, SimClock,
    Simulation, SimulationConfig, UnservedRequestPolicy,
};
use purify::core::{ArrivalSchedule, InterArrival};

use approx::assert_relative_eq;

// Small schedule so every test finishes quickly
fn short_schedule() -> ArrivalSchedule {
    ArrivalSchedule {
        entanglement: InterArrival::Fixed { interval: 1e-4 },
        entanglement_count: 5_000,
        request: InterArrival::Gamma { shape: 2.0, scale: 2.5e-3 },
        request_count: 100,
    }
}

fn config(seed: u64, policy: PolicyConfig) -> SimulationConfig {
    SimulationConfig { schedule: short_schedule(), ..SimulationConfig::sample(seed, policy) }
}

fn to_purify(e: ConfigError) -> PurifyError {
    PurifyError::InvalidState { message: e.to_string() }
}

#[test]
fn test_fresh_pair_serves_immediate_request() -> Result<(), PurifyError> {
    // two generations at t = 1, 2 and one request at t = 2.5
    let node_config = NodeConfig {
        generation_success_probability: 1.0,
        decoherence_time: 1e9,
        lambdas: [0.0; 3],
        ..NodeConfig::default()
    };
    let clock = SimClock::from_samples(vec![1.0, 1.0, 1.0], vec![2.5, 10.0]);
    let mut sim = Simulation::from_parts(clock, Node::new(node_config, 42), Policy::Fixed(Action::Replace));

    sim.step()?;
    assert!(sim.node().good_slot().is_some());
    sim.step()?;
    assert_relative_eq!(sim.node().good_fidelity(2.0), 1.0, epsilon = 1e-8);
    sim.step()?;

    assert_eq!(sim.records().len(), 1);
    let (fidelity, waiting_time) = sim.records()[0].as_tuple();
    assert_relative_eq!(fidelity, 1.0, epsilon = 1e-8);
    assert_relative_eq!(waiting_time, 0.0);
    Ok(())
}

#[test]
fn test_same_seed_same_report() -> Result<(), PurifyError> {
    let config = config(42, PolicyConfig::Fixed { action: Action::Protocol2 });
    let first = Simulation::new(&config).map_err(to_purify)?.run()?;
    let second = Simulation::new(&config).map_err(to_purify)?.run()?;
    assert_eq!(first, second);
    assert!(!first.records.is_empty());
    Ok(())
}

#[test]
fn test_different_seeds_differ() -> Result<(), PurifyError> {
    let a = Simulation::new(&config(1, PolicyConfig::Fixed { action: Action::Replace })).map_err(to_purify)?.run()?;
    let b = Simulation::new(&config(2, PolicyConfig::Fixed { action: Action::Replace })).map_err(to_purify)?.run()?;
    assert_ne!(a.records, b.records);
    Ok(())
}

#[test]
fn test_every_policy_yields_physical_records() -> Result<(), PurifyError> {
    let policies = [
        PolicyConfig::Fixed { action: Action::Replace },
        PolicyConfig::Fixed { action: Action::Protocol1 },
        PolicyConfig::Fixed { action: Action::Protocol3 },
        PolicyConfig::Fixed { action: Action::Pmd },
        PolicyConfig::Fixed { action: Action::Defer },
        PolicyConfig::ProbabilityGated { action: Action::Protocol2 },
        PolicyConfig::UniformRandom { actions: Action::ALL.to_vec() },
    ];
    for policy in policies {
        let report = Simulation::new(&config(7, policy)).map_err(to_purify)?.run()?;
        for record in &report.records {
            assert!((0.0..=1.0).contains(&record.fidelity), "fidelity {}", record.fidelity);
            assert!(record.waiting_time >= 0.0);
        }
    }
    Ok(())
}

#[test]
fn test_snapshots_respect_slot_invariant() -> Result<(), PurifyError> {
    let mut config = config(11, PolicyConfig::UniformRandom { actions: Action::ALL.to_vec() });
    config.record_snapshots = true;
    let report = Simulation::new(&config).map_err(to_purify)?.run()?;
    assert!(!report.snapshots.is_empty());
    for snapshot in &report.snapshots {
        assert!(snapshot.bad.is_none() || snapshot.good.is_some());
    }
    Ok(())
}

#[test]
fn test_closed_gate_never_purifies() -> Result<(), PurifyError> {
    let mut config = config(3, PolicyConfig::ProbabilityGated { action: Action::Protocol1 });
    config.node.pumping_probability = 0.0;
    let report = Simulation::new(&config).map_err(to_purify)?.run()?;
    assert_eq!(report.stats.purification_attempts, 0);
    assert!(report.stats.gate_skips > 0);
    Ok(())
}

#[test]
fn test_record_zero_counts_empty_services() -> Result<(), PurifyError> {
    let mut config = config(5, PolicyConfig::Fixed { action: Action::Replace });
    config.node.generation_success_probability = 0.0;
    config.node.unserved_request = UnservedRequestPolicy::RecordZero;
    let report = Simulation::new(&config).map_err(to_purify)?.run()?;
    assert!(!report.records.is_empty());
    assert!(report.records.iter().all(|r| r.kind == ServiceKind::MemoryEmpty && r.fidelity == 0.0));
    assert_eq!(report.served_count(), 0);
    assert_eq!(report.dropped_requests, 0);
    Ok(())
}

#[test]
fn test_external_agent_drives_actions() -> Result<(), PurifyError> {
    let config = config(9, PolicyConfig::Fixed { action: Action::Replace });
    // pump only while the good pair is still reasonably fresh
    let agent = |obs: &Observation| {
        if obs.good_fidelity > 0.6 { Action::Protocol2 } else { Action::Replace }
    };
    let mut sim = Simulation::new(&config).map_err(to_purify)?.with_policy(Policy::external(agent));
    let report = sim.run()?;
    assert!(report.stats.purification_attempts > 0);
    Ok(())
}

#[test]
fn test_step_with_matches_fixed_policy() -> Result<(), PurifyError> {
    let config = config(21, PolicyConfig::Fixed { action: Action::Protocol3 });
    let fixed = Simulation::new(&config).map_err(to_purify)?.run()?;

    let mut driven = Simulation::new(&config).map_err(to_purify)?;
    while driven.step_with(Action::Protocol3)? {}
    assert_eq!(driven.report(), fixed);
    Ok(())
}

#[test]
fn test_toml_config_runs() -> Result<(), PurifyError> {
    let raw = r#"
        seed = 99

        [node]
        generation-success-probability = 0.5
        decoherence-time = 0.002
        lambda-strategy = "dominant-random"
        lambdas = [0.2, 0.0, 0.0]
        dominant-fidelity = 0.7

        [schedule]
        entanglement = { kind = "exponential", mean = 0.0001 }
        entanglement-count = 3000
        request = { kind = "gamma", shape = 2.0, scale = 0.0025 }
        request-count = 50

        [policy]
        kind = "fixed"
        action = "protocol1"
    "#;
    let config = SimulationConfig::from_toml_str(raw).map_err(to_purify)?;
    let report = Simulation::new(&config).map_err(to_purify)?.run()?;
    assert!(report.stats.generation_attempts > 0);
    assert!(report.stats.generation_successes <= report.stats.generation_attempts);
    Ok(())
}
