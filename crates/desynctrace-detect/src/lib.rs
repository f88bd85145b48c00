//! The detection engine: fingerprinting, the blind timing oracle, the
//! socket-poisoning oracle, and the per-vector state machine that wires them
//! together.

mod blind;
mod collector;
mod fingerprint;
mod poison;
mod state;
#[cfg(test)]
mod test_support;
mod timeouts;

pub use blind::BlindDetector;
pub use collector::FindingCollector;
pub use fingerprint::Fingerprinter;
pub use poison::PoisoningDetector;
pub use state::{run_vector, VectorOutcome, VectorState};
pub use timeouts::Timeouts;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeouts_respect_threshold_invariant() {
        let timeouts = Timeouts::default();
        assert!(timeouts.blind_threshold < timeouts.request);
    }
}
