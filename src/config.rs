//! Process-wide gate configuration.
//!
//! The signing secret is required and has no default; everything else falls back to
//! [`GateConfig::DEFAULT_TOKEN_LIFETIME`] and [`RateLimit::default`]. Configuration is
//! read once at startup and is immutable afterwards.

// self
use crate::{
	_prelude::*,
	auth::{SigningSecret, TokenClaims},
	error::ConfigError,
	governor::RateLimit,
};

/// Environment variable holding the signing secret.
pub const ENV_SIGNING_SECRET: &str = "JWT_SECRET";
/// Environment variable holding the token lifetime (`7d`, `12h`, `30m`, `45s`, or seconds).
pub const ENV_TOKEN_LIFETIME: &str = "JWT_EXPIRES_IN";
/// Environment variable holding the per-window request budget.
pub const ENV_RATE_LIMIT_MAX: &str = "RATE_LIMIT_MAX_REQUESTS";
/// Environment variable holding the rate window in milliseconds.
pub const ENV_RATE_LIMIT_WINDOW_MS: &str = "RATE_LIMIT_WINDOW_MS";

/// Validated gate configuration.
#[derive(Clone, Debug)]
pub struct GateConfig {
	signing_secret: SigningSecret,
	token_lifetime: Duration,
	rate_limit: RateLimit,
}
impl GateConfig {
	/// Default token lifetime (7 days).
	pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::days(7);

	/// Returns a builder seeded with defaults.
	pub fn builder() -> GateConfigBuilder {
		GateConfigBuilder::default()
	}

	/// Reads configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads configuration through an arbitrary key lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut builder = Self::builder();

		if let Some(secret) = lookup(ENV_SIGNING_SECRET) {
			builder = builder.signing_secret(secret);
		}
		if let Some(raw) = lookup(ENV_TOKEN_LIFETIME) {
			builder = builder.token_lifetime(parse_lifetime(&raw).ok_or(
				ConfigError::InvalidEnvValue { key: ENV_TOKEN_LIFETIME, value: raw.clone() },
			)?);
		}
		if let Some(raw) = lookup(ENV_RATE_LIMIT_MAX) {
			let max = raw.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvValue {
				key: ENV_RATE_LIMIT_MAX,
				value: raw.clone(),
			})?;

			builder = builder.rate_limit_max(max);
		}
		if let Some(raw) = lookup(ENV_RATE_LIMIT_WINDOW_MS) {
			let millis = raw.trim().parse::<i64>().map_err(|_| ConfigError::InvalidEnvValue {
				key: ENV_RATE_LIMIT_WINDOW_MS,
				value: raw.clone(),
			})?;

			builder = builder.rate_limit_window(Duration::milliseconds(millis));
		}

		builder.build()
	}

	/// Signing secret shared by issuance and verification.
	pub fn signing_secret(&self) -> &SigningSecret {
		&self.signing_secret
	}

	/// Lifetime applied to newly issued tokens.
	pub fn token_lifetime(&self) -> Duration {
		self.token_lifetime
	}

	/// Per-principal request budget.
	pub fn rate_limit(&self) -> RateLimit {
		self.rate_limit
	}
}

/// Builder for [`GateConfig`] values.
#[derive(Debug)]
pub struct GateConfigBuilder {
	/// Signing secret; required.
	pub signing_secret: Option<SigningSecret>,
	/// Token lifetime.
	pub token_lifetime: Duration,
	/// Rate limit budget.
	pub rate_limit: RateLimit,
}
impl GateConfigBuilder {
	/// Sets the signing secret.
	pub fn signing_secret(mut self, secret: impl AsRef<str>) -> Self {
		self.signing_secret = Some(SigningSecret::new(secret));

		self
	}

	/// Overrides the token lifetime.
	pub fn token_lifetime(mut self, lifetime: Duration) -> Self {
		self.token_lifetime = lifetime;

		self
	}

	/// Overrides the maximum number of requests per window.
	pub fn rate_limit_max(mut self, max_requests: u32) -> Self {
		self.rate_limit.max_requests = max_requests;

		self
	}

	/// Overrides the rate window duration.
	pub fn rate_limit_window(mut self, window: Duration) -> Self {
		self.rate_limit.window = window;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GateConfig, ConfigError> {
		let signing_secret = self
			.signing_secret
			.filter(|secret| !secret.is_empty())
			.ok_or(ConfigError::MissingSigningSecret)?;

		TokenClaims::validate_lifetime(self.token_lifetime)?;
		self.rate_limit.validate()?;

		Ok(GateConfig {
			signing_secret,
			token_lifetime: self.token_lifetime,
			rate_limit: self.rate_limit,
		})
	}
}
impl Default for GateConfigBuilder {
	fn default() -> Self {
		Self {
			signing_secret: None,
			token_lifetime: GateConfig::DEFAULT_TOKEN_LIFETIME,
			rate_limit: RateLimit::default(),
		}
	}
}

/// Parses `7d`, `12h`, `30m`, `45s`, or a bare number of seconds.
fn parse_lifetime(raw: &str) -> Option<Duration> {
	let raw = raw.trim();
	let (digits, unit) = match raw.char_indices().last()? {
		(idx, c) if c.is_ascii_alphabetic() => (&raw[..idx], c),
		_ => (raw, 's'),
	};
	let value = digits.parse::<i64>().ok()?;
	let scale = match unit {
		'd' => 86_400,
		'h' => 3_600,
		'm' => 60,
		's' => 1,
		_ => return None,
	};

	value.checked_mul(scale).map(Duration::seconds)
}
