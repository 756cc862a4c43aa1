//! Gate-level error types shared across the codec, resolver, governor, and stores.

// self
use crate::_prelude::*;

/// Gate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical gate error exposed by public APIs.
///
/// Authentication failures are not represented here; the gate reports them through
/// [`Outcome::Unauthenticated`](crate::gate::Outcome::Unauthenticated). This type only
/// carries conditions that are not a verdict about the caller.
#[derive(Debug, ThisError)]
pub enum Error {
	/// User-store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Configuration and validation failures. All of them are fatal at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// No signing secret was supplied (or it was empty).
	#[error("A token signing secret must be configured.")]
	MissingSigningSecret,
	/// Token lifetime must be strictly positive.
	#[error("Token lifetime must be positive.")]
	NonPositiveTokenLifetime,
	/// Token lifetime is shorter than the one-second resolution of the claim timestamps.
	#[error("Token lifetime must be at least one second.")]
	TokenLifetimeTooShort,
	/// Token lifetime exceeds the supported maximum.
	#[error("Token lifetime must not exceed {max}.")]
	TokenLifetimeTooLarge {
		/// Largest accepted lifetime.
		max: Duration,
	},
	/// A rate limit must admit at least one request per window.
	#[error("Rate limit must allow at least one request per window.")]
	ZeroRateLimit,
	/// Rate limit window must be strictly positive.
	#[error("Rate limit window must be positive.")]
	NonPositiveRateWindow,
	/// The computed token expiry falls outside the supported calendar range.
	#[error("A token issued at {issued_at} would expire past the supported calendar range.")]
	TokenExpiryOutOfRange {
		/// Issue instant that could not be extended by the lifetime.
		issued_at: OffsetDateTime,
	},
	/// Rate limit window exceeds the supported maximum.
	#[error("Rate limit window must not exceed {max}.")]
	RateWindowTooLarge {
		/// Largest accepted window.
		max: Duration,
	},
	/// An environment value could not be parsed.
	#[error("Environment value `{key}` is invalid: `{value}`.")]
	InvalidEnvValue {
		/// Variable name.
		key: &'static str,
		/// Raw value that failed to parse.
		value: String,
	},
	/// Token signing failed.
	#[error("Token could not be encoded.")]
	TokenEncoding {
		/// Underlying encoder failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}
impl From<jsonwebtoken::errors::Error> for ConfigError {
	fn from(e: jsonwebtoken::errors::Error) -> Self {
		Self::TokenEncoding { source: e }
	}
}

/// Verification failures raised by the token codec.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenError {
	/// Signature is valid but the token is past its expiry.
	#[error("Token expired at {expired_at}.")]
	Expired {
		/// Expiry instant carried by the (trusted) claim set.
		expired_at: OffsetDateTime,
	},
	/// Signature mismatch or malformed structure.
	#[error("Token is invalid: {reason}.")]
	Invalid {
		/// Decoder-supplied reason string.
		reason: String,
	},
}

/// Why a request could not be authenticated.
///
/// The variants stay distinguishable for logs and metrics; callers only ever observe
/// [`Outcome::Unauthenticated`](crate::gate::Outcome::Unauthenticated).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ThisError)]
pub enum AuthFailure {
	/// No bearer credential was presented.
	#[error("No credential was provided.")]
	NoCredential,
	/// The token's expiry has passed.
	#[error("Token has expired.")]
	TokenExpired,
	/// The token failed signature or structure checks.
	#[error("Token is invalid.")]
	TokenInvalid,
	/// The token subject has no active record in the user store.
	#[error("Principal was not found.")]
	PrincipalNotFound,
}
impl AuthFailure {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthFailure::NoCredential => "no_credential",
			AuthFailure::TokenExpired => "token_expired",
			AuthFailure::TokenInvalid => "token_invalid",
			AuthFailure::PrincipalNotFound => "principal_not_found",
		}
	}
}
impl From<TokenError> for AuthFailure {
	fn from(e: TokenError) -> Self {
		match e {
			TokenError::Expired { .. } => Self::TokenExpired,
			TokenError::Invalid { .. } => Self::TokenInvalid,
		}
	}
}

/// Failures raised by [`PrincipalResolver::resolve`](crate::resolver::PrincipalResolver::resolve).
#[derive(Debug, ThisError)]
pub enum ResolveError {
	/// The credential does not establish a principal.
	#[error(transparent)]
	Auth(#[from] AuthFailure),
	/// The user store could not answer the lookup.
	#[error(transparent)]
	Store(#[from] crate::store::StoreError),
}
impl From<TokenError> for ResolveError {
	fn from(e: TokenError) -> Self {
		Self::Auth(e.into())
	}
}
