//! Sweeps the memory decoherence time and fibre length, comparing plain
//! replacement with protocol-2 pumping at each point.

use purify::core::constants::link_constants;
use purify::core::generation_probability_from_attenuation;
use purify::{Action, PolicyConfig, Simulation, SimulationConfig};

fn mean_fidelity(config: &SimulationConfig) -> Option<f64> {
    let mut sim = Simulation::new(config).ok()?;
    sim.run().ok()?.mean_fidelity()
}

fn main() {
    let decoherence_times = [1e-4, 3e-4, 1e-3, 3e-3, 1e-2];
    let lengths = [10_000.0, 20_000.0, 40_000.0];

    for length in lengths {
        let p_g = generation_probability_from_attenuation(link_constants::ETA, length);
        println!("\nFibre length {:.0} km, generation probability {:.4}", length / 1000.0, p_g);
        println!("{:>12} {:>12} {:>12}", "tau [s]", "Replace", "Protocol 2");

        for tau in decoherence_times {
            let mut fidelities = Vec::with_capacity(2);
            for action in [Action::Replace, Action::Protocol2] {
                let mut config = SimulationConfig::sample(7, PolicyConfig::Fixed { action });
                config.node.generation_success_probability = p_g;
                config.node.decoherence_time = tau;
                config.schedule.entanglement_count = 100_000;
                config.schedule.request_count = 1_000;
                fidelities.push(mean_fidelity(&config));
            }

            let show = |f: Option<f64>| f.map_or_else(|| "n/a".to_string(), |f| format!("{:.6}", f));
            println!("{:>12.1e} {:>12} {:>12}", tau, show(fidelities[0]), show(fidelities[1]));
        }
    }
}
