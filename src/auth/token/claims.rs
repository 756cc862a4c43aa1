//! Claim set encoded inside issued tokens.

// self
use crate::{
	_prelude::*,
	auth::{Principal, Role, UserId},
	error::ConfigError,
};

/// Identity fields a caller asks the codec to sign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrincipalClaims {
	/// Subject identifier.
	pub user_id: UserId,
	/// Email at issuance time.
	pub email: String,
	/// Role at issuance time.
	pub role: Role,
}
impl PrincipalClaims {
	/// Creates a claim request for the provided subject.
	pub fn new(user_id: UserId, email: impl Into<String>, role: Role) -> Self {
		Self { user_id, email: email.into(), role }
	}
}
impl From<&Principal> for PrincipalClaims {
	fn from(principal: &Principal) -> Self {
		Self::new(principal.user_id().clone(), principal.email(), principal.role())
	}
}

/// Immutable claim set carried by a token.
///
/// Timestamps are whole seconds since the Unix epoch on the wire (`iat`, `exp`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
	/// Subject identifier.
	pub sub: UserId,
	/// Subject email.
	pub email: String,
	/// Subject role.
	pub role: Role,
	/// Issued-at instant.
	#[serde(with = "time::serde::timestamp")]
	pub iat: OffsetDateTime,
	/// Expiry instant; the token is unusable at or after this instant.
	#[serde(with = "time::serde::timestamp")]
	pub exp: OffsetDateTime,
}
impl TokenClaims {
	/// Shortest lifetime that survives whole-second timestamps.
	pub const MIN_LIFETIME: Duration = Duration::SECOND;
	/// Longest accepted lifetime (10 years).
	pub const MAX_LIFETIME: Duration = Duration::days(3_650);

	/// Checks that `lifetime` yields tokens usable for at least one second and whose
	/// expiry stays well inside the calendar range.
	pub fn validate_lifetime(lifetime: Duration) -> Result<(), ConfigError> {
		if !lifetime.is_positive() {
			return Err(ConfigError::NonPositiveTokenLifetime);
		}
		if lifetime < Self::MIN_LIFETIME {
			return Err(ConfigError::TokenLifetimeTooShort);
		}
		if lifetime > Self::MAX_LIFETIME {
			return Err(ConfigError::TokenLifetimeTooLarge { max: Self::MAX_LIFETIME });
		}

		Ok(())
	}

	/// Builds a claim set issued at `issued_at` and valid for `lifetime`.
	///
	/// Both instants are truncated to whole seconds so they survive the wire format. An
	/// expiry past the representable calendar range is rejected.
	pub fn new(
		claims: PrincipalClaims,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Result<Self, ConfigError> {
		let iat = truncate_to_second(issued_at);
		let exp = iat
			.checked_add(lifetime)
			.map(truncate_to_second)
			.ok_or(ConfigError::TokenExpiryOutOfRange { issued_at: iat })?;

		Ok(Self { sub: claims.user_id, email: claims.email, role: claims.role, iat, exp })
	}

	/// Returns `true` if the claim set has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.exp
	}

	/// Time left before expiry at the provided instant (zero once expired).
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		if self.is_expired_at(instant) { Duration::ZERO } else { self.exp - instant }
	}

	/// Identity fields without the timestamps.
	pub fn principal_claims(&self) -> PrincipalClaims {
		PrincipalClaims::new(self.sub.clone(), self.email.clone(), self.role)
	}
}

fn truncate_to_second(instant: OffsetDateTime) -> OffsetDateTime {
	instant - Duration::nanoseconds(i64::from(instant.nanosecond()))
}
