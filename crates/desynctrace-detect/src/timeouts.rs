use std::time::Duration;

/// The three timeout budgets from the concurrency model, plus the poisoning
/// detector's attack-to-victim gap target. `blind_threshold` must be less
/// than `request`; that invariant is enforced where a [`Timeouts`] is
/// constructed from configuration, not here, so this type can stay a plain
/// data holder.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub connect: Duration,
    pub request: Duration,
    pub blind_threshold: Duration,
    pub poison_gap: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            request: Duration::from_secs(5),
            blind_threshold: Duration::from_secs(4),
            poison_gap: Duration::from_millis(200),
        }
    }
}
