//! Redacting wrappers for the signing secret and presented bearer tokens.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Process-wide HMAC signing secret; never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Arc<str>);
impl SigningSecret {
	/// Wraps a secret string.
	pub fn new(value: impl AsRef<str>) -> Self {
		Self(Arc::from(value.as_ref()))
	}

	/// Returns the raw secret bytes. Callers must avoid logging them.
	pub fn expose(&self) -> &[u8] {
		self.0.as_bytes()
	}

	/// Returns `true` when the secret has no content.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for SigningSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningSecret").field(&"<redacted>").finish()
	}
}

/// Bearer credential extracted from a request header.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);
impl BearerToken {
	/// Wraps a raw token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Stable fingerprint safe to put in logs.
	///
	/// The fingerprint is a base64 (no padding) encoding of the SHA-256 digest of the
	/// token, truncated to 16 characters.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.0.as_bytes());

		let mut encoded = STANDARD_NO_PAD.encode(hasher.finalize());

		encoded.truncate(16);

		encoded
	}
}
impl AsRef<str> for BearerToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&self.fingerprint()).finish()
	}
}
impl Display for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
