//! User-store contract consulted during principal resolution, plus an in-memory backend.

pub mod memory;

pub use memory::MemoryUserStore;

// self
use crate::{
	_prelude::*,
	auth::{Role, UserId},
};

/// Boxed future returned by [`UserStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Authority on which users exist and are allowed in.
///
/// A token only proves what was true at issuance; the store decides whether the subject
/// is still active.
pub trait UserStore
where
	Self: Send + Sync,
{
	/// Fetches the user record for `id`, if present.
	fn find_by_id<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<UserRecord>>;

	/// Records that `id` was seen at `instant`. Best-effort.
	fn touch_last_seen<'a>(&'a self, id: &'a UserId, instant: OffsetDateTime)
	-> StoreFuture<'a, ()>;
}

/// User data the gate needs from the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
	/// User identifier.
	pub id: UserId,
	/// Current email.
	pub email: String,
	/// Current role.
	pub role: Role,
	/// Inactive users cannot authenticate even with a valid token.
	pub active: bool,
}
impl UserRecord {
	/// Creates an active record.
	pub fn new(id: UserId, email: impl Into<String>, role: Role) -> Self {
		Self { id, email: email.into(), role, active: true }
	}

	/// Overrides the active flag.
	pub fn with_active(mut self, active: bool) -> Self {
		self.active = active;

		self
	}
}

/// Error type produced by [`UserStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
