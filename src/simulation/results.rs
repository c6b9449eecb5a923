// src/simulation/results.rs
use crate::core::Event;
use crate::node::{NodeStats, ServiceKind, ServiceRecord};
use std::fmt;

/// Slot fidelities right after one handled event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotSnapshot {
    /// Simulated time of the event.
    pub time: f64,
    /// The event that was handled.
    pub event: Event,
    /// Good-slot fidelity, if occupied.
    pub good: Option<f64>,
    /// Bad-slot fidelity, if occupied.
    pub bad: Option<f64>,
    /// Whether a request is still pending.
    pub request_waiting: bool,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationReport {
    /// Completed services in order.
    pub records: Vec<ServiceRecord>,
    /// Per-step slot snapshots; empty unless recording was enabled.
    pub snapshots: Vec<SlotSnapshot>,
    /// Node counters at the end of the run.
    pub stats: NodeStats,
    /// Arrivals dropped because a request was already pending.
    pub dropped_requests: u64,
}

impl SimulationReport {
    /// Number of services that teleported over a stored pair.
    pub fn served_count(&self) -> usize {
        self.records.iter().filter(|r| r.kind == ServiceKind::Teleported).count()
    }

    /// Mean delivered fidelity over all records, `None` for an empty run.
    pub fn mean_fidelity(&self) -> Option<f64> {
        mean(self.records.iter().map(|r| r.fidelity))
    }

    /// Mean waiting time over all records, `None` for an empty run.
    pub fn mean_waiting_time(&self) -> Option<f64> {
        mean(self.records.iter().map(|r| r.waiting_time))
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    Some(values.sum::<f64>() / n as f64)
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation Report:")?;
        writeln!(f, "  Services: {} ({} teleported)", self.records.len(), self.served_count())?;
        match (self.mean_fidelity(), self.mean_waiting_time()) {
            (Some(fidelity), Some(waiting)) => {
                writeln!(f, "  Mean fidelity: {:.6}", fidelity)?;
                writeln!(f, "  Mean waiting time: {:.6} s", waiting)?;
            }
            _ => writeln!(f, "  No requests were served.")?,
        }
        writeln!(f, "  Dropped requests: {}", self.dropped_requests)?;
        writeln!(
            f,
            "  Generation: {}/{} succeeded",
            self.stats.generation_successes, self.stats.generation_attempts
        )?;
        writeln!(
            f,
            "  Purification: {}/{} succeeded",
            self.stats.purification_successes, self.stats.purification_attempts
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fidelity: f64, waiting_time: f64, kind: ServiceKind) -> ServiceRecord {
        ServiceRecord { fidelity, waiting_time, kind }
    }

    #[test]
    fn test_empty_report_has_no_means() {
        let report = SimulationReport::default();
        assert_eq!(report.mean_fidelity(), None);
        assert_eq!(report.served_count(), 0);
        assert!(report.to_string().contains("No requests were served"));
    }

    #[test]
    fn test_means_include_empty_memory_records() {
        let report = SimulationReport {
            records: vec![
                record(0.9, 1.0, ServiceKind::Teleported),
                record(0.0, 3.0, ServiceKind::MemoryEmpty),
            ],
            ..SimulationReport::default()
        };
        assert_eq!(report.served_count(), 1);
        assert_eq!(report.mean_fidelity(), Some(0.45));
        assert_eq!(report.mean_waiting_time(), Some(2.0));
    }
}
