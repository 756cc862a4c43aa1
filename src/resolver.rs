//! Turns a raw `Authorization` header into a verified [`Principal`].
//!
//! Resolution has two authorities: the token codec proves the claim set was issued by
//! us and has not expired, and the user store decides whether the subject may still
//! sign in. A valid token for a deleted or deactivated account is rejected.

// self
use crate::{
	_prelude::*,
	auth::{BearerToken, Principal, TokenCodec},
	clock::{Clock, SystemClock},
	error::{AuthFailure, ResolveError},
	obs::{self, GateMetrics},
	store::UserStore,
};

/// Scheme prefix accepted by [`extract_credential`]; case-sensitive, single space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Pulls the bearer token out of an `Authorization` header value.
///
/// Returns `None` for an absent header, another scheme, a wrongly cased scheme, or an
/// empty/whitespace-bearing token. Absence is not an error at this layer.
pub fn extract_credential(header: Option<&str>) -> Option<BearerToken> {
	let token = header?.strip_prefix(BEARER_PREFIX)?;

	if token.is_empty() || token.contains(char::is_whitespace) {
		return None;
	}

	Some(BearerToken::new(token))
}

/// Verifies credentials and looks their subject up in the user store.
#[derive(Clone)]
pub struct PrincipalResolver {
	codec: TokenCodec,
	store: Arc<dyn UserStore>,
	clock: Arc<dyn Clock>,
	metrics: Arc<GateMetrics>,
}
impl PrincipalResolver {
	/// Creates a resolver over the provided codec and store.
	pub fn new(codec: TokenCodec, store: Arc<dyn UserStore>) -> Self {
		Self { codec, store, clock: Arc::new(SystemClock), metrics: Default::default() }
	}

	/// Overrides the clock used to stamp `last seen` updates.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Shares a metrics sink (used to count swallowed side-effect failures).
	pub fn with_metrics(mut self, metrics: Arc<GateMetrics>) -> Self {
		self.metrics = metrics;

		self
	}

	/// Codec used for verification.
	pub fn codec(&self) -> &TokenCodec {
		&self.codec
	}

	/// Extracts and resolves in one step; a missing credential is [`AuthFailure::NoCredential`].
	pub async fn resolve_header(&self, header: Option<&str>) -> Result<Principal, ResolveError> {
		let credential = extract_credential(header).ok_or(AuthFailure::NoCredential)?;

		self.resolve(&credential).await
	}

	/// Verifies `credential` and resolves its subject against the user store.
	///
	/// On success the store is asked to record the access. That update is best-effort:
	/// its failure is logged and counted but never fails the resolution.
	pub async fn resolve(&self, credential: &BearerToken) -> Result<Principal, ResolveError> {
		let claims = self.codec.verify_bearer(credential)?;
		let record = self
			.store
			.find_by_id(&claims.sub)
			.await?
			.filter(|record| record.active)
			.ok_or(AuthFailure::PrincipalNotFound)?;

		if let Err(e) = self.store.touch_last_seen(&record.id, self.clock.now()).await {
			self.metrics.record_touch_failure();
			obs::log_best_effort_failure("touch_last_seen", &e);
		}

		Ok(Principal::new(record.id, record.email, record.role))
	}
}
impl Debug for PrincipalResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PrincipalResolver")
			.field("codec", &self.codec)
			.field("clock", &self.clock)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{
		auth::{PrincipalClaims, Role, SigningSecret, UserId},
		clock::ManualClock,
		store::{MemoryUserStore, StoreError, UserRecord},
	};

	const NOW: OffsetDateTime = macros::datetime!(2025-02-02 10:00 UTC);

	struct Fixture {
		resolver: PrincipalResolver,
		store: MemoryUserStore,
		clock: ManualClock,
		metrics: Arc<GateMetrics>,
	}

	fn fixture() -> Fixture {
		let clock = ManualClock::new(NOW);
		let codec = TokenCodec::new(
			&SigningSecret::new("resolver-secret"),
			Duration::hours(1),
			Arc::new(clock.clone()),
		)
		.expect("Codec fixture should build.");
		let store = MemoryUserStore::default();
		let metrics = Arc::new(GateMetrics::default());
		let resolver = PrincipalResolver::new(codec, Arc::new(store.clone()))
			.with_clock(Arc::new(clock.clone()))
			.with_metrics(metrics.clone());

		Fixture { resolver, store, clock, metrics }
	}

	fn user() -> UserId {
		UserId::new("user-7").expect("User fixture should be valid.")
	}

	fn token_for(fixture: &Fixture, role: Role) -> BearerToken {
		fixture
			.resolver
			.codec()
			.issue(PrincipalClaims::new(user(), "lin@example.com", role))
			.expect("Issuing should succeed.")
			.token
	}

	#[test]
	fn extract_accepts_only_well_formed_bearer_headers() {
		assert_eq!(
			extract_credential(Some("Bearer abc123")).map(|t| t.expose().to_owned()),
			Some("abc123".into())
		);

		for header in [
			None,
			Some("Basic xyz"),
			Some("Bearer"),
			Some("Bearer "),
			Some("bearer abc"),
			Some("Bearer  abc"),
			Some("Bearer a b"),
		] {
			assert!(
				extract_credential(header).is_none(),
				"Header {header:?} must not yield a credential."
			);
		}
	}

	#[tokio::test]
	async fn resolves_active_user_and_touches_last_seen() {
		let fixture = fixture();

		fixture.store.insert(UserRecord::new(user(), "lin@example.com", Role::Admin));

		let token = token_for(&fixture, Role::Admin);
		let principal =
			fixture.resolver.resolve(&token).await.expect("Active user should resolve.");

		assert_eq!(principal.user_id(), &user());
		assert!(principal.is_admin());
		assert_eq!(fixture.store.last_seen(&user()), Some(NOW));
	}

	#[tokio::test]
	async fn store_record_is_authoritative_over_token_claims() {
		let fixture = fixture();
		let token = token_for(&fixture, Role::Admin);

		fixture.store.insert(UserRecord::new(user(), "new@example.com", Role::User));

		let principal = fixture.resolver.resolve(&token).await.expect("User should resolve.");

		assert_eq!(principal.role(), Role::User);
		assert_eq!(principal.email(), "new@example.com");
	}

	#[tokio::test]
	async fn missing_or_inactive_user_is_not_found() {
		let fixture = fixture();
		let token = token_for(&fixture, Role::User);

		assert!(matches!(
			fixture.resolver.resolve(&token).await,
			Err(ResolveError::Auth(AuthFailure::PrincipalNotFound))
		));

		fixture
			.store
			.insert(UserRecord::new(user(), "lin@example.com", Role::User).with_active(false));

		assert!(matches!(
			fixture.resolver.resolve(&token).await,
			Err(ResolveError::Auth(AuthFailure::PrincipalNotFound))
		));
	}

	#[tokio::test]
	async fn codec_failures_propagate_unchanged() {
		let fixture = fixture();

		fixture.store.insert(UserRecord::new(user(), "lin@example.com", Role::User));

		let token = token_for(&fixture, Role::User);

		assert!(matches!(
			fixture.resolver.resolve(&BearerToken::new("garbage")).await,
			Err(ResolveError::Auth(AuthFailure::TokenInvalid))
		));

		fixture.clock.advance(Duration::hours(2));

		assert!(matches!(
			fixture.resolver.resolve(&token).await,
			Err(ResolveError::Auth(AuthFailure::TokenExpired))
		));
		assert!(matches!(
			fixture.resolver.resolve_header(None).await,
			Err(ResolveError::Auth(AuthFailure::NoCredential))
		));
	}

	#[tokio::test]
	async fn touch_failure_does_not_fail_resolution() {
		let fixture = fixture();

		fixture.store.insert(UserRecord::new(user(), "lin@example.com", Role::User));
		fixture.store.fail_touches_with(Some(StoreError::Backend { message: "replica".into() }));

		let token = token_for(&fixture, Role::User);
		let header = format!("Bearer {}", token.expose());
		let principal = fixture
			.resolver
			.resolve_header(Some(&header))
			.await
			.expect("Resolution must survive a failed touch.");

		assert_eq!(principal.role(), Role::User);
		assert_eq!(fixture.metrics.touch_failures(), 1);
		assert_eq!(fixture.store.last_seen(&user()), None);
	}
}
