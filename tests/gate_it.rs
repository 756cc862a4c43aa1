// std
use std::sync::Arc;
// crates.io
use time::{Duration, OffsetDateTime, macros};
// self
use api_gate::{
	auth::{Role, UserId},
	clock::{Clock, ManualClock},
	config::GateConfig,
	error::{AuthFailure, Error},
	gate::{AuthGate, Outcome},
	governor::RateDecision,
	store::{MemoryUserStore, StoreError, StoreFuture, UserRecord, UserStore},
};

const NOW: OffsetDateTime = macros::datetime!(2025-03-14 09:30 UTC);
const SECRET: &str = "integration-signing-secret";

struct Harness {
	gate: AuthGate,
	store: MemoryUserStore,
	clock: ManualClock,
}

fn harness_with(config: GateConfig) -> Harness {
	let clock = ManualClock::new(NOW);
	let store = MemoryUserStore::default();
	let gate =
		AuthGate::from_config_with_clock(&config, Arc::new(store.clone()), Arc::new(clock.clone()))
			.expect("Gate fixture should build.");

	Harness { gate, store, clock }
}

fn harness() -> Harness {
	harness_with(
		GateConfig::builder().signing_secret(SECRET).build().expect("Config fixture should build."),
	)
}

fn user(id: &str) -> UserId {
	UserId::new(id).expect("User fixture should be valid.")
}

fn bearer_for(harness: &Harness, id: &str, role: Role) -> String {
	harness.store.insert(UserRecord::new(user(id), format!("{id}@example.com"), role));

	let token = harness
		.gate
		.issue_token(user(id), format!("{id}@example.com"), role)
		.expect("Issuing a token should succeed.");

	format!("Bearer {token}")
}

#[tokio::test]
async fn registered_user_is_admitted_with_its_role() {
	let harness = harness();
	let header = bearer_for(&harness, "alice", Role::User);
	let outcome = harness
		.gate
		.authenticate(Some(&header), Some("198.51.100.7"))
		.await
		.expect("Authentication should not hit an infrastructure error.");
	let principal = outcome.principal().expect("Registered user should be admitted.");

	assert_eq!(principal.user_id(), &user("alice"));
	assert_eq!(principal.role(), Role::User);
	assert_eq!(principal.email(), "alice@example.com");
	assert_eq!(outcome.http_status(), 200);
	assert_eq!(harness.store.last_seen(&user("alice")), Some(NOW));
	assert_eq!(harness.gate.metrics().admitted(), 1);
}

#[tokio::test]
async fn missing_or_foreign_credentials_are_unauthenticated() {
	let harness = harness();

	for header in [None, Some("Basic YWxpY2U6cHc="), Some("bearer abc"), Some("Bearer ")] {
		let outcome = harness
			.gate
			.authenticate(header, None)
			.await
			.expect("Authentication should not hit an infrastructure error.");

		assert_eq!(outcome, Outcome::Unauthenticated(AuthFailure::NoCredential));
		assert_eq!(outcome.http_status(), 401);
	}

	assert_eq!(harness.gate.metrics().unauthenticated(), 4);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
	let harness = harness();
	let impostor = harness_with(
		GateConfig::builder()
			.signing_secret("some-other-secret")
			.build()
			.expect("Config fixture should build."),
	);
	let header = bearer_for(&impostor, "mallory", Role::Admin);

	harness.store.insert(UserRecord::new(user("mallory"), "mallory@example.com", Role::Admin));

	let outcome = harness
		.gate
		.authenticate(Some(&header), None)
		.await
		.expect("Authentication should not hit an infrastructure error.");

	assert_eq!(outcome, Outcome::Unauthenticated(AuthFailure::TokenInvalid));
}

#[tokio::test]
async fn token_expires_exactly_at_its_lifetime() {
	let harness = harness();
	let header = bearer_for(&harness, "bob", Role::User);

	harness.clock.advance(GateConfig::DEFAULT_TOKEN_LIFETIME - Duration::SECOND);

	assert!(
		harness
			.gate
			.authenticate(Some(&header), None)
			.await
			.expect("Authentication should not hit an infrastructure error.")
			.is_admitted()
	);

	harness.clock.advance(Duration::SECOND);

	assert_eq!(
		harness
			.gate
			.authenticate(Some(&header), None)
			.await
			.expect("Authentication should not hit an infrastructure error."),
		Outcome::Unauthenticated(AuthFailure::TokenExpired)
	);
}

#[tokio::test]
async fn deactivated_or_deleted_users_lose_access() {
	let harness = harness();
	let header = bearer_for(&harness, "carol", Role::Admin);

	harness.store.set_active(&user("carol"), false);

	assert_eq!(
		harness
			.gate
			.authenticate(Some(&header), None)
			.await
			.expect("Authentication should not hit an infrastructure error."),
		Outcome::Unauthenticated(AuthFailure::PrincipalNotFound)
	);

	harness.store.remove(&user("carol"));

	assert_eq!(
		harness
			.gate
			.authenticate(Some(&header), None)
			.await
			.expect("Authentication should not hit an infrastructure error."),
		Outcome::Unauthenticated(AuthFailure::PrincipalNotFound)
	);
}

#[tokio::test]
async fn hundred_and_first_request_in_the_window_is_throttled() {
	let harness = harness();
	let header = bearer_for(&harness, "dave", Role::User);

	for _ in 0..100 {
		assert!(
			harness
				.gate
				.authenticate(Some(&header), None)
				.await
				.expect("Authentication should not hit an infrastructure error.")
				.is_admitted()
		);
	}

	let throttled = harness
		.gate
		.authenticate(Some(&header), None)
		.await
		.expect("Authentication should not hit an infrastructure error.");

	assert_eq!(
		throttled,
		Outcome::TooManyRequests {
			retry_after: Duration::minutes(15),
			reset_at: NOW + Duration::minutes(15),
		}
	);
	assert_eq!(throttled.http_status(), 429);
	assert_eq!(harness.gate.metrics().admitted(), 100);
	assert_eq!(harness.gate.metrics().throttled(), 1);

	harness.clock.advance(Duration::minutes(15) + Duration::SECOND);

	assert!(
		harness
			.gate
			.authenticate(Some(&header), None)
			.await
			.expect("Authentication should not hit an infrastructure error.")
			.is_admitted()
	);
}

#[tokio::test]
async fn principals_do_not_share_budgets() {
	let harness = harness_with(
		GateConfig::builder()
			.signing_secret(SECRET)
			.rate_limit_max(1)
			.build()
			.expect("Config fixture should build."),
	);
	let erin = bearer_for(&harness, "erin", Role::User);
	let frank = bearer_for(&harness, "frank", Role::User);
	let origin = Some("203.0.113.50");

	for header in [&erin, &frank] {
		assert!(
			harness
				.gate
				.authenticate(Some(header), origin)
				.await
				.expect("Authentication should not hit an infrastructure error.")
				.is_admitted()
		);
	}

	assert!(matches!(
		harness
			.gate
			.authenticate(Some(&erin), origin)
			.await
			.expect("Authentication should not hit an infrastructure error."),
		Outcome::TooManyRequests { .. }
	));
	assert!(
		harness
			.gate
			.throttle(origin)
			.await
			.expect("Throttling should not hit an infrastructure error.")
			.is_admitted(),
		"Public traffic from the same origin has its own window."
	);
}

#[tokio::test]
async fn public_requests_fall_back_from_origin_to_anonymous() {
	let harness = harness_with(
		GateConfig::builder()
			.signing_secret(SECRET)
			.rate_limit_max(2)
			.rate_limit_window(Duration::minutes(1))
			.build()
			.expect("Config fixture should build."),
	);
	let throttle = |origin: Option<&'static str>| {
		let gate = &harness.gate;

		async move {
			gate.throttle(origin).await.expect("Throttling should not hit an infrastructure error.")
		}
	};

	assert!(throttle(Some("192.0.2.1")).await.is_admitted());
	assert!(throttle(Some("192.0.2.1")).await.is_admitted());
	assert_eq!(
		throttle(Some("192.0.2.1")).await,
		RateDecision::Rejected {
			retry_after: Duration::minutes(1),
			reset_at: NOW + Duration::minutes(1),
		}
	);

	// An unusable origin is counted against the shared anonymous key.
	assert!(throttle(None).await.is_admitted());
	assert!(throttle(Some("")).await.is_admitted());
	assert!(!throttle(None).await.is_admitted());
	assert_eq!(harness.clock.now(), NOW);
}

#[tokio::test]
async fn failed_last_seen_update_does_not_block_admission() {
	let harness = harness();
	let header = bearer_for(&harness, "grace", Role::User);

	harness.store.fail_touches_with(Some(StoreError::Backend { message: "replica lag".into() }));

	let outcome = harness
		.gate
		.authenticate(Some(&header), None)
		.await
		.expect("A failed touch must not surface as an error.");

	assert!(outcome.is_admitted());
	assert_eq!(harness.gate.metrics().touch_failures(), 1);
	assert_eq!(harness.store.last_seen(&user("grace")), None);
}

struct UnavailableStore;
impl UserStore for UnavailableStore {
	fn find_by_id<'a>(&'a self, _: &'a UserId) -> StoreFuture<'a, Option<UserRecord>> {
		Box::pin(async { Err(StoreError::Backend { message: "connection refused".into() }) })
	}

	fn touch_last_seen<'a>(&'a self, _: &'a UserId, _: OffsetDateTime) -> StoreFuture<'a, ()> {
		Box::pin(async { Ok(()) })
	}
}

#[tokio::test]
async fn store_outage_is_an_error_not_a_rejection() {
	let config =
		GateConfig::builder().signing_secret(SECRET).build().expect("Config fixture should build.");
	let gate = AuthGate::from_config_with_clock(
		&config,
		Arc::new(UnavailableStore),
		Arc::new(ManualClock::new(NOW)),
	)
	.expect("Gate fixture should build.");
	let token =
		gate.issue_token(user("heidi"), "heidi@example.com", Role::User).expect("Issue should work.");
	let err = gate
		.authenticate(Some(&format!("Bearer {token}")), None)
		.await
		.expect_err("A store outage must surface as an error.");

	assert!(matches!(err, Error::Storage(StoreError::Backend { .. })));
	assert_eq!(gate.metrics().errors(), 1);
	assert_eq!(gate.metrics().unauthenticated(), 0);
}

#[tokio::test]
async fn overlong_origins_are_not_pooled_with_anonymous_traffic() {
	let harness = harness_with(
		GateConfig::builder()
			.signing_secret(SECRET)
			.rate_limit_max(1)
			.build()
			.expect("Config fixture should build."),
	);
	let first = format!("proxy-{}", "a".repeat(200));
	let second = format!("proxy-{}", "b".repeat(200));

	for origin in [Some(first.as_str()), Some(second.as_str()), None] {
		assert!(
			harness
				.gate
				.throttle(origin)
				.await
				.expect("Throttling should not hit an infrastructure error.")
				.is_admitted(),
			"Each overlong origin and the anonymous key have separate windows."
		);
	}

	assert!(
		!harness
			.gate
			.throttle(Some(&first))
			.await
			.expect("Throttling should not hit an infrastructure error.")
			.is_admitted()
	);
}

#[tokio::test]
async fn end_of_calendar_clock_fails_issuance_without_panicking() {
	let config =
		GateConfig::builder().signing_secret(SECRET).build().expect("Config fixture should build.");
	let gate = AuthGate::from_config_with_clock(
		&config,
		Arc::new(MemoryUserStore::default()),
		Arc::new(ManualClock::new(macros::datetime!(9999-12-30 00:00 UTC))),
	)
	.expect("Gate fixture should build.");

	assert!(gate.issue_token(user("ivan"), "ivan@example.com", Role::User).is_err());
	assert!(
		gate.throttle(Some("192.0.2.99"))
			.await
			.expect("Throttling should not hit an infrastructure error.")
			.is_admitted()
	);
}

#[test]
fn out_of_range_durations_are_rejected_at_startup() {
	const HUGE_WINDOW: &[(&str, &str)] =
		&[("JWT_SECRET", SECRET), ("RATE_LIMIT_WINDOW_MS", "9223372036854775807")];
	const HUGE_LIFETIME: &[(&str, &str)] =
		&[("JWT_SECRET", SECRET), ("JWT_EXPIRES_IN", "100000000d")];
	const OVERFLOWING_LIFETIME: &[(&str, &str)] =
		&[("JWT_SECRET", SECRET), ("JWT_EXPIRES_IN", "999999999999999999d")];

	for pairs in [HUGE_WINDOW, HUGE_LIFETIME, OVERFLOWING_LIFETIME] {
		let config = GateConfig::from_lookup(|key| {
			pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v).to_owned())
		});

		assert!(config.is_err(), "Configuration {pairs:?} must be rejected.");
	}
}
