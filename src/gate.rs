//! Single per-request admission decision: authenticate, then rate-limit.
//!
//! [`AuthGate::authenticate`] is the only place where the detailed failure taxonomy is
//! collapsed into what a caller may see. Expired, forged, and orphaned tokens all become
//! [`Outcome::Unauthenticated`]; the specific [`AuthFailure`] is kept on the variant for
//! logs and metrics, and [`Outcome::http_status`] does not distinguish between them.
//! Rate limiting is a separate outcome so callers can tell "who you are is wrong" apart
//! from "slow down".

// self
use crate::{
	_prelude::*,
	auth::{IssuedToken, Principal, PrincipalClaims, Role, TokenCodec, UserId},
	clock::{Clock, SystemClock},
	config::GateConfig,
	error::{AuthFailure, ConfigError, ResolveError},
	governor::{FixedWindowGovernor, RateDecision, RateGovernor, RateKey, RateLimit},
	obs::{self, DecisionOutcome, GateMetrics, GateSpan, GateStage},
	resolver::{self, PrincipalResolver},
	store::UserStore,
};

/// Result of [`AuthGate::authenticate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
	/// Request may proceed; attach the principal to the request context.
	Admitted(Principal),
	/// Request carries no usable identity. The reason is for diagnostics only.
	Unauthenticated(AuthFailure),
	/// Principal exceeded its request budget.
	TooManyRequests {
		/// Time until the budget renews.
		retry_after: Duration,
		/// End of the live window.
		reset_at: OffsetDateTime,
	},
}
impl Outcome {
	/// Returns the admitted principal, if any.
	pub fn principal(&self) -> Option<&Principal> {
		match self {
			Self::Admitted(principal) => Some(principal),
			_ => None,
		}
	}

	/// Returns `true` for [`Outcome::Admitted`].
	pub fn is_admitted(&self) -> bool {
		matches!(self, Self::Admitted(_))
	}

	/// Coarse label for the outcome.
	pub fn kind(&self) -> DecisionOutcome {
		match self {
			Self::Admitted(_) => DecisionOutcome::Admitted,
			Self::Unauthenticated(_) => DecisionOutcome::Unauthenticated,
			Self::TooManyRequests { .. } => DecisionOutcome::TooManyRequests,
		}
	}

	/// HTTP status a transport should answer with (200, 401, or 429).
	pub fn http_status(&self) -> u16 {
		match self {
			Self::Admitted(_) => 200,
			Self::Unauthenticated(_) => 401,
			Self::TooManyRequests { .. } => 429,
		}
	}
}

/// Composes principal resolution and rate governance into one admission decision.
#[derive(Clone)]
pub struct AuthGate {
	resolver: PrincipalResolver,
	governor: Arc<dyn RateGovernor>,
	limit: RateLimit,
	metrics: Arc<GateMetrics>,
}
impl AuthGate {
	/// Creates a gate from explicit parts.
	pub fn new(
		resolver: PrincipalResolver,
		governor: Arc<dyn RateGovernor>,
		limit: RateLimit,
	) -> Self {
		let metrics = Arc::new(GateMetrics::default());

		Self { resolver: resolver.with_metrics(metrics.clone()), governor, limit, metrics }
	}

	/// Builds a gate from configuration with the system clock and an in-memory governor.
	pub fn from_config(
		config: &GateConfig,
		store: Arc<dyn UserStore>,
	) -> Result<Self, ConfigError> {
		Self::from_config_with_clock(config, store, Arc::new(SystemClock))
	}

	/// Builds a gate from configuration, reading time from `clock`.
	pub fn from_config_with_clock(
		config: &GateConfig,
		store: Arc<dyn UserStore>,
		clock: Arc<dyn Clock>,
	) -> Result<Self, ConfigError> {
		let codec = TokenCodec::new(config.signing_secret(), config.token_lifetime(), clock.clone())?;
		let resolver = PrincipalResolver::new(codec, store).with_clock(clock.clone());
		let governor = Arc::new(FixedWindowGovernor::new(clock));

		Ok(Self::new(resolver, governor, config.rate_limit()))
	}

	/// Decision counters.
	pub fn metrics(&self) -> &GateMetrics {
		&self.metrics
	}

	/// Budget applied per principal.
	pub fn rate_limit(&self) -> RateLimit {
		self.limit
	}

	/// Issues a token for a login or registration flow.
	pub fn issue(&self, claims: PrincipalClaims) -> Result<IssuedToken, ConfigError> {
		let _guard = GateSpan::new(GateStage::Issue, None).entered();

		self.resolver.codec().issue(claims)
	}

	/// Issues a token and returns its encoded form.
	pub fn issue_token(
		&self,
		user_id: UserId,
		email: impl Into<String>,
		role: Role,
	) -> Result<String, ConfigError> {
		let issued = self.issue(PrincipalClaims::new(user_id, email, role))?;

		Ok(issued.token.expose().to_owned())
	}

	/// Authenticates the request, then counts it against the principal's budget.
	///
	/// `origin` only tags the request span; admitted principals are always keyed by user.
	///
	/// `Err` is reserved for infrastructure failures (user store or governor backend);
	/// every verdict about the caller is an [`Outcome`].
	pub async fn authenticate(
		&self,
		authorization: Option<&str>,
		origin: Option<&str>,
	) -> Result<Outcome> {
		let span = GateSpan::new(GateStage::Authenticate, origin);

		span.instrument(self.authenticate_inner(authorization)).await
	}

	/// Rate-limits a public request by connection origin (or the anonymous key).
	pub async fn throttle(&self, origin: Option<&str>) -> Result<RateDecision> {
		let span = GateSpan::new(GateStage::Throttle, origin);

		span.instrument(self.throttle_inner(origin)).await
	}

	async fn authenticate_inner(&self, authorization: Option<&str>) -> Result<Outcome> {
		let Some(credential) = resolver::extract_credential(authorization) else {
			return Ok(self.unauthenticated(AuthFailure::NoCredential, None));
		};
		let principal = match self.resolver.resolve(&credential).await {
			Ok(principal) => principal,
			Err(ResolveError::Auth(failure)) =>
				return Ok(self.unauthenticated(failure, Some(&credential.fingerprint()))),
			Err(ResolveError::Store(e)) => {
				self.metrics.record(DecisionOutcome::Error, "user_store");

				return Err(e.into());
			},
		};
		let key = RateKey::for_principal(&principal);

		match self.governed(&key).await? {
			RateDecision::Admitted { .. } => {
				self.metrics.record(DecisionOutcome::Admitted, "ok");

				Ok(Outcome::Admitted(principal))
			},
			RateDecision::Rejected { retry_after, reset_at } =>
				Ok(Outcome::TooManyRequests { retry_after, reset_at }),
		}
	}

	async fn throttle_inner(&self, origin: Option<&str>) -> Result<RateDecision> {
		let key = origin.and_then(RateKey::for_raw_origin).unwrap_or_else(RateKey::anonymous);
		let decision = self.governed(&key).await?;

		if decision.is_admitted() {
			self.metrics.record(DecisionOutcome::Admitted, "public");
		}

		Ok(decision)
	}

	async fn governed(&self, key: &RateKey) -> Result<RateDecision> {
		let decision = self.governor.admit(key, self.limit).await.inspect_err(|_| {
			self.metrics.record(DecisionOutcome::Error, "governor");
		})?;

		if let RateDecision::Rejected { retry_after, .. } = decision {
			self.metrics.record(DecisionOutcome::TooManyRequests, "rate_limited");
			obs::log_throttled(key.as_str(), retry_after);
		}

		Ok(decision)
	}

	fn unauthenticated(&self, failure: AuthFailure, fingerprint: Option<&str>) -> Outcome {
		self.metrics.record(DecisionOutcome::Unauthenticated, failure.as_str());
		obs::log_unauthenticated(failure.as_str(), fingerprint);

		Outcome::Unauthenticated(failure)
	}
}
impl Debug for AuthGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthGate")
			.field("resolver", &self.resolver)
			.field("limit", &self.limit)
			.field("metrics", &self.metrics)
			.finish()
	}
}
