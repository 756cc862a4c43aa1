//! HMAC-signed token issuance and verification.
//!
//! Tokens are compact JWS strings signed with HS256. Verification is split in two
//! ordered stages: the signature (and structure) is checked first, and only a
//! signature-valid claim set has its expiry consulted. A forged token therefore always
//! reports [`TokenError::Invalid`], even when its claimed expiry is in the past.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, PrincipalClaims, SigningSecret, TokenClaims},
	clock::{Clock, SystemClock},
	config::GateConfig,
	error::{ConfigError, TokenError},
};

/// Token produced by [`TokenCodec::issue`].
#[derive(Clone, Debug)]
pub struct IssuedToken {
	/// Encoded token to hand to the client.
	pub token: BearerToken,
	/// Claim set signed into the token.
	pub claims: TokenClaims,
}

/// Issues and verifies signed, expiring identity tokens.
#[derive(Clone)]
pub struct TokenCodec {
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
	validation: Validation,
	lifetime: Duration,
	clock: Arc<dyn Clock>,
}
impl TokenCodec {
	/// Default token lifetime (7 days).
	pub const DEFAULT_LIFETIME: Duration = Duration::days(7);

	/// Creates a codec for the provided secret and lifetime, reading time from `clock`.
	pub fn new(
		secret: &SigningSecret,
		lifetime: Duration,
		clock: Arc<dyn Clock>,
	) -> Result<Self, ConfigError> {
		if secret.is_empty() {
			return Err(ConfigError::MissingSigningSecret);
		}

		TokenClaims::validate_lifetime(lifetime)?;

		let mut validation = Validation::new(Algorithm::HS256);

		// Expiry is checked against the injected clock after the signature passes.
		validation.validate_exp = false;
		validation.validate_nbf = false;
		validation.validate_aud = false;
		validation.required_spec_claims.clear();

		Ok(Self {
			encoding_key: EncodingKey::from_secret(secret.expose()),
			decoding_key: DecodingKey::from_secret(secret.expose()),
			validation,
			lifetime,
			clock,
		})
	}

	/// Creates a codec from validated configuration using the system clock.
	pub fn from_config(config: &GateConfig) -> Result<Self, ConfigError> {
		Self::new(config.signing_secret(), config.token_lifetime(), Arc::new(SystemClock))
	}

	/// Configured token lifetime.
	pub fn lifetime(&self) -> Duration {
		self.lifetime
	}

	/// Signs a claim set issued now and expiring after the configured lifetime.
	pub fn issue(&self, claims: PrincipalClaims) -> Result<IssuedToken, ConfigError> {
		let claims = TokenClaims::new(claims, self.clock.now(), self.lifetime)?;
		let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

		Ok(IssuedToken { token: BearerToken::new(token), claims })
	}

	/// Verifies the signature first, then expiry, and returns the trusted claim set.
	pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
		let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
			.map_err(|e| TokenError::Invalid { reason: e.to_string() })?;
		let claims = data.claims;

		if claims.is_expired_at(self.clock.now()) {
			return Err(TokenError::Expired { expired_at: claims.exp });
		}

		Ok(claims)
	}

	/// Convenience wrapper around [`TokenCodec::verify`] for extracted credentials.
	pub fn verify_bearer(&self, token: &BearerToken) -> Result<TokenClaims, TokenError> {
		self.verify(token.expose())
	}
}
impl Debug for TokenCodec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCodec")
			.field("algorithm", &Algorithm::HS256)
			.field("lifetime", &self.lifetime)
			.field("clock", &self.clock)
			.finish()
	}
}
