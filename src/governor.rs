//! Per-key request budgeting.
//!
//! [`RateGovernor`] is the seam between the gate and whatever owns the counters. The
//! built-in [`FixedWindowGovernor`] keeps them in process memory, so a restart clears
//! every window; a shared backend for multi-instance deployments can implement the same
//! trait without touching the gate.

pub mod fixed_window;

pub use fixed_window::FixedWindowGovernor;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, OriginId, Principal},
	error::ConfigError,
	store::StoreError,
};

/// Boxed future returned by [`RateGovernor::admit`].
pub type GovernorFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RateDecision, StoreError>> + 'a + Send>>;

/// Strategy that admits or rejects the next request for a key.
pub trait RateGovernor
where
	Self: Send + Sync,
{
	/// Counts one request against `key` under `limit` and reports the verdict.
	fn admit<'a>(&'a self, key: &'a RateKey, limit: RateLimit) -> GovernorFuture<'a>;
}

/// Request budget applied per key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RateLimit {
	/// Maximum admitted requests per window.
	pub max_requests: u32,
	/// Window length.
	pub window: Duration,
}
impl RateLimit {
	/// Default budget: 100 requests.
	pub const DEFAULT_MAX_REQUESTS: u32 = 100;
	/// Default window: 15 minutes.
	pub const DEFAULT_WINDOW: Duration = Duration::minutes(15);
	/// Longest accepted window (one year).
	pub const MAX_WINDOW: Duration = Duration::days(366);

	/// Creates a budget of `max_requests` per `window`.
	pub const fn new(max_requests: u32, window: Duration) -> Self {
		Self { max_requests, window }
	}

	/// Rejects budgets that cannot admit anything, never roll over, or outlive a year.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_requests == 0 {
			return Err(ConfigError::ZeroRateLimit);
		}
		if !self.window.is_positive() {
			return Err(ConfigError::NonPositiveRateWindow);
		}
		if self.window > Self::MAX_WINDOW {
			return Err(ConfigError::RateWindowTooLarge { max: Self::MAX_WINDOW });
		}

		Ok(())
	}
}
impl Default for RateLimit {
	fn default() -> Self {
		Self::new(Self::DEFAULT_MAX_REQUESTS, Self::DEFAULT_WINDOW)
	}
}

/// Key a request is counted against.
///
/// Keys are namespaced so a user identifier can never share a window with a connection
/// origin that happens to spell the same string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RateKey(String);
impl RateKey {
	/// Sentinel used when neither a principal nor an origin is known.
	pub const ANONYMOUS: &'static str = "anonymous";

	/// Picks the principal, then the origin, then the anonymous sentinel.
	pub fn derive(principal: Option<&Principal>, origin: Option<&OriginId>) -> Self {
		match (principal, origin) {
			(Some(principal), _) => Self::for_principal(principal),
			(None, Some(origin)) => Self::for_origin(origin),
			(None, None) => Self::anonymous(),
		}
	}

	/// Key for an authenticated principal.
	pub fn for_principal(principal: &Principal) -> Self {
		Self(format!("user:{}", principal.user_id()))
	}

	/// Key for a connection origin.
	pub fn for_origin(origin: &OriginId) -> Self {
		Self(format!("origin:{origin}"))
	}

	/// Key for an unvalidated origin string.
	///
	/// Origins too long for [`OriginId`] are keyed by their SHA-256 digest so they keep a
	/// window of their own. Empty or whitespace-bearing origins yield `None`.
	pub fn for_raw_origin(raw: &str) -> Option<Self> {
		match OriginId::new(raw) {
			Ok(origin) => Some(Self::for_origin(&origin)),
			Err(IdentifierError::TooLong { .. }) => {
				let digest = STANDARD_NO_PAD.encode(Sha256::digest(raw.as_bytes()));

				Some(Self(format!("origin-digest:{digest}")))
			},
			Err(_) => None,
		}
	}

	/// Shared key for unidentifiable callers.
	pub fn anonymous() -> Self {
		Self(Self::ANONYMOUS.to_owned())
	}

	/// Returns the namespaced key string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for RateKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Counter state for one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateWindow {
	/// Requests admitted in the live window.
	pub count: u32,
	/// Instant after which the window is replaced on next access.
	pub reset_at: OffsetDateTime,
}

/// Verdict returned by a [`RateGovernor`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateDecision {
	/// The request counts against the budget and may proceed.
	Admitted {
		/// Requests still available in the live window.
		remaining: u32,
		/// End of the live window.
		reset_at: OffsetDateTime,
	},
	/// The budget is exhausted; the request must not proceed.
	Rejected {
		/// Time until the window resets.
		retry_after: Duration,
		/// End of the live window.
		reset_at: OffsetDateTime,
	},
}
impl RateDecision {
	/// Returns `true` for [`RateDecision::Admitted`].
	pub fn is_admitted(&self) -> bool {
		matches!(self, Self::Admitted { .. })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{Role, UserId};

	#[test]
	fn key_prefers_principal_then_origin_then_anonymous() {
		let principal = Principal::new(
			UserId::new("u-1").expect("User fixture should be valid."),
			"u@example.com",
			Role::User,
		);
		let origin = OriginId::new("198.51.100.4").expect("Origin fixture should be valid.");

		assert_eq!(RateKey::derive(Some(&principal), Some(&origin)).as_str(), "user:u-1");
		assert_eq!(RateKey::derive(None, Some(&origin)).as_str(), "origin:198.51.100.4");
		assert_eq!(RateKey::derive(None, None).as_str(), RateKey::ANONYMOUS);
	}

	#[test]
	fn overlong_origins_keep_distinct_keys() {
		let first = format!("{}a", "x".repeat(200));
		let second = format!("{}b", "x".repeat(200));
		let first_key = RateKey::for_raw_origin(&first).expect("Overlong origin should be keyed.");

		assert!(first_key.as_str().starts_with("origin-digest:"));
		assert_eq!(RateKey::for_raw_origin(&first), Some(first_key.clone()));
		assert_ne!(RateKey::for_raw_origin(&second), Some(first_key));
		assert_eq!(
			RateKey::for_raw_origin("192.0.2.4").map(|key| key.as_str().to_owned()),
			Some("origin:192.0.2.4".to_owned())
		);
		assert_eq!(RateKey::for_raw_origin(""), None);
		assert_eq!(RateKey::for_raw_origin("a b"), None);
	}

	#[test]
	fn default_limit_matches_documented_values() {
		let limit = RateLimit::default();

		assert_eq!(limit, RateLimit::new(100, Duration::minutes(15)));
		assert!(limit.validate().is_ok());
		assert!(RateLimit::new(0, Duration::SECOND).validate().is_err());
		assert!(RateLimit::new(1, Duration::ZERO).validate().is_err());
		assert!(RateLimit::new(1, RateLimit::MAX_WINDOW).validate().is_ok());
		assert!(matches!(
			RateLimit::new(1, Duration::milliseconds(i64::MAX)).validate(),
			Err(ConfigError::RateWindowTooLarge { .. })
		));
	}
}
