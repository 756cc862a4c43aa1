//! Wall-clock sources used for token expiry and rate windows.

// self
use crate::_prelude::*;

/// Source of the current instant.
pub trait Clock
where
	Self: Debug + Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for tests and simulations.
///
/// Clones share the same instant, so advancing one clone advances all of them.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(start)))
	}

	/// Moves the clock forward (or backward, for negative durations).
	pub fn advance(&self, delta: Duration) {
		*self.0.lock() += delta;
	}

	/// Jumps to a specific instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn manual_clock_is_shared_between_clones() {
		let start = macros::datetime!(2025-01-01 00:00 UTC);
		let clock = ManualClock::new(start);
		let other = clock.clone();

		other.advance(Duration::seconds(10));

		assert_eq!(clock.now(), start + Duration::seconds(10));

		clock.set(start);

		assert_eq!(other.now(), start);
	}

	#[test]
	fn system_clock_moves_forward() {
		let clock = SystemClock;
		let t1 = clock.now();
		let t2 = clock.now();

		assert!(t2 >= t1);
	}
}
