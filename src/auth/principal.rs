//! Verified request identity.

// self
use crate::{
	_prelude::*,
	auth::{Role, UserId},
};

/// Identity established for a single request after token verification and a user-store
/// lookup.
///
/// Fields are read-only; a principal is built once by the resolver and handed to the
/// request handler by value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
	user_id: UserId,
	email: String,
	role: Role,
}
impl Principal {
	/// Creates a principal from resolved user data.
	pub fn new(user_id: UserId, email: impl Into<String>, role: Role) -> Self {
		Self { user_id, email: email.into(), role }
	}

	/// Opaque user identifier.
	pub fn user_id(&self) -> &UserId {
		&self.user_id
	}

	/// Email on record.
	pub fn email(&self) -> &str {
		&self.email
	}

	/// Granted role.
	pub fn role(&self) -> Role {
		self.role
	}

	/// Returns `true` for [`Role::Admin`] principals.
	pub fn is_admin(&self) -> bool {
		matches!(self.role, Role::Admin)
	}
}
