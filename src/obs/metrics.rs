// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::DecisionOutcome;

/// Records a decision via the global metrics recorder (when enabled).
pub fn record_decision(outcome: DecisionOutcome, reason: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"api_gate_decision_total",
			"outcome" => outcome.as_str(),
			"reason" => reason
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (outcome, reason);
	}
}

/// Thread-safe counters for gate decisions.
#[derive(Debug, Default)]
pub struct GateMetrics {
	admitted: AtomicU64,
	unauthenticated: AtomicU64,
	throttled: AtomicU64,
	errors: AtomicU64,
	touch_failures: AtomicU64,
}
impl GateMetrics {
	/// Returns the number of admitted requests.
	pub fn admitted(&self) -> u64 {
		self.admitted.load(Ordering::Relaxed)
	}

	/// Returns the number of requests rejected as unauthenticated.
	pub fn unauthenticated(&self) -> u64 {
		self.unauthenticated.load(Ordering::Relaxed)
	}

	/// Returns the number of requests rejected by the rate governor.
	pub fn throttled(&self) -> u64 {
		self.throttled.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that failed on an infrastructure error.
	pub fn errors(&self) -> u64 {
		self.errors.load(Ordering::Relaxed)
	}

	/// Returns the number of swallowed `touch_last_seen` failures.
	pub fn touch_failures(&self) -> u64 {
		self.touch_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: DecisionOutcome, reason: &'static str) {
		let counter = match outcome {
			DecisionOutcome::Admitted => &self.admitted,
			DecisionOutcome::Unauthenticated => &self.unauthenticated,
			DecisionOutcome::TooManyRequests => &self.throttled,
			DecisionOutcome::Error => &self.errors,
		};

		counter.fetch_add(1, Ordering::Relaxed);
		record_decision(outcome, reason);
	}

	pub(crate) fn record_touch_failure(&self) {
		self.touch_failures.fetch_add(1, Ordering::Relaxed);
	}
}
