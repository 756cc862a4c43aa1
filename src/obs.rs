//! Optional observability helpers for gate decisions.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (default) to run every gate call inside an `api_gate.request` span
//!   carrying the `stage` field, and to log rejection reasons and best-effort failures.
//! - Enable `metrics` to increment the `api_gate_decision_total` counter for every
//!   decision, labeled by `outcome` + `reason`.
//!
//! [`GateMetrics`] is always available and keeps in-process counters.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Gate entry points observed by spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateStage {
	/// Token issuance for login/registration.
	Issue,
	/// Full authentication + rate admission.
	Authenticate,
	/// Rate admission for public routes.
	Throttle,
}
impl GateStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			GateStage::Issue => "issue",
			GateStage::Authenticate => "authenticate",
			GateStage::Throttle => "throttle",
		}
	}
}
impl Display for GateStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecisionOutcome {
	/// Request may proceed.
	Admitted,
	/// Request lacks a valid identity.
	Unauthenticated,
	/// Request exceeded its rate budget.
	TooManyRequests,
	/// An infrastructure dependency failed.
	Error,
}
impl DecisionOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DecisionOutcome::Admitted => "admitted",
			DecisionOutcome::Unauthenticated => "unauthenticated",
			DecisionOutcome::TooManyRequests => "too_many_requests",
			DecisionOutcome::Error => "error",
		}
	}
}
impl Display for DecisionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
