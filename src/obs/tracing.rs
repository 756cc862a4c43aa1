// self
use crate::{_prelude::*, obs::GateStage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedGate<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedGate<F> = F;

/// A span builder used by gate entry points.
#[derive(Clone, Debug)]
pub struct GateSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl GateSpan {
	/// Creates a new span tagged with the provided stage and connection origin.
	pub fn new(stage: GateStage, origin: Option<&str>) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"api_gate.request",
				stage = stage.as_str(),
				origin = origin.unwrap_or("-")
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, origin);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> GateSpanGuard {
		#[cfg(feature = "tracing")]
		{
			GateSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			GateSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedGate<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`GateSpan::entered`].
pub struct GateSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for GateSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("GateSpanGuard(..)")
	}
}

/// Logs why a request was not authenticated; the reason never reaches the caller.
pub fn log_unauthenticated(reason: &'static str, token_fingerprint: Option<&str>) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(reason, token = token_fingerprint.unwrap_or("-"), "request unauthenticated");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (reason, token_fingerprint);
	}
}

/// Logs a rate-limit rejection.
pub fn log_throttled(key: &str, retry_after: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(key, retry_after_ms = retry_after.whole_milliseconds() as i64, "request throttled");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, retry_after);
	}
}

/// Logs a swallowed failure of a best-effort side effect.
pub fn log_best_effort_failure(operation: &'static str, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(operation, error = %error, "best-effort operation failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, error);
	}
}
