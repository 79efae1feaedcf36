//! Monotonic time source used by the telemetry publisher and perception loop.
use embassy_time::Instant;

/// Read the current instant. Implementations must be monotonic.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Clock backed by the `embassy-time` driver of the target.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
