//! Runs every fixed strategy on the same arrival schedule and compares the
//! delivered teleportation fidelity.

use purify::{Action, PolicyConfig, Simulation, SimulationConfig};

fn main() {
    let strategies = [
        ("Replace", PolicyConfig::Fixed { action: Action::Replace }),
        ("Protocol 1", PolicyConfig::Fixed { action: Action::Protocol1 }),
        ("Protocol 2", PolicyConfig::Fixed { action: Action::Protocol2 }),
        ("Protocol 3", PolicyConfig::Fixed { action: Action::Protocol3 }),
        ("PMD", PolicyConfig::Fixed { action: Action::Pmd }),
        ("Gated protocol 2", PolicyConfig::ProbabilityGated { action: Action::Protocol2 }),
        ("Random agent", PolicyConfig::UniformRandom { actions: Action::ALL.to_vec() }),
    ];

    println!("Comparing strategies over the reference link (seed 42)...");
    println!("{:<18} {:>9} {:>12} {:>14} {:>9}", "strategy", "served", "mean F", "mean wait [s]", "dropped");

    for (name, policy) in strategies {
        let mut config = SimulationConfig::sample(42, policy);
        config.node.pumping_probability = 0.5;

        let mut sim = match Simulation::new(&config) {
            Ok(sim) => sim,
            Err(e) => {
                eprintln!("{}: invalid configuration: {}", name, e);
                continue;
            }
        };

        match sim.run() {
            Ok(report) => {
                println!(
                    "{:<18} {:>9} {:>12.6} {:>14.6} {:>9}",
                    name,
                    report.served_count(),
                    report.mean_fidelity().unwrap_or(0.0),
                    report.mean_waiting_time().unwrap_or(0.0),
                    report.dropped_requests
                );
            }
            Err(e) => eprintln!("{}: run aborted: {}", name, e),
        }
    }
}
