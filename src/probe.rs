//! Target readiness probing
//!
//! The polling policy is the one piece of this agent meant to be replaced:
//! anything implementing [`ReadinessProbe`] can stand in for the fixed-delay
//! stub without touching the wait loop.

use std::time::Duration;

/// Single predicate asked repeatedly until the target is considered usable.
pub trait ReadinessProbe: Send + Sync {
    fn is_running(&self) -> bool;
}

/// Placeholder probe: sleeps a fixed interval and reports the target up.
///
/// The hypervisor sometimes reports the VM running while it is still
/// reverting, so a blind delay is safer than trusting its state here.
/// TODO: replace with a probe that pings an agent inside the guest.
pub struct FixedDelayProbe {
    delay: Duration,
}

impl FixedDelayProbe {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelayProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl ReadinessProbe for FixedDelayProbe {
    fn is_running(&self) -> bool {
        std::thread::sleep(self.delay);
        true
    }
}
