//! Thread-safe in-memory [`UserStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::UserId,
	store::{StoreError, StoreFuture, UserRecord, UserStore},
};

#[derive(Clone, Debug)]
struct Entry {
	record: UserRecord,
	last_seen: Option<OffsetDateTime>,
}

type UserMap = Arc<RwLock<HashMap<UserId, Entry>>>;

/// Thread-safe user store that keeps records in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore {
	users: UserMap,
	touch_failure: Arc<Mutex<Option<StoreError>>>,
}
impl MemoryUserStore {
	/// Inserts or replaces a record.
	pub fn insert(&self, record: UserRecord) {
		self.users.write().insert(record.id.clone(), Entry { record, last_seen: None });
	}

	/// Flips the active flag; returns `false` when the user is unknown.
	pub fn set_active(&self, id: &UserId, active: bool) -> bool {
		match self.users.write().get_mut(id) {
			Some(entry) => {
				entry.record.active = active;

				true
			},
			None => false,
		}
	}

	/// Removes a record, returning it if present.
	pub fn remove(&self, id: &UserId) -> Option<UserRecord> {
		self.users.write().remove(id).map(|entry| entry.record)
	}

	/// Last instant recorded by [`UserStore::touch_last_seen`].
	pub fn last_seen(&self, id: &UserId) -> Option<OffsetDateTime> {
		self.users.read().get(id).and_then(|entry| entry.last_seen)
	}

	/// Makes every subsequent `touch_last_seen` fail with `error` (`None` restores success).
	pub fn fail_touches_with(&self, error: Option<StoreError>) {
		*self.touch_failure.lock() = error;
	}

	fn find_now(map: UserMap, id: UserId) -> Option<UserRecord> {
		map.read().get(&id).map(|entry| entry.record.clone())
	}

	fn touch_now(map: UserMap, id: UserId, instant: OffsetDateTime) -> Result<(), StoreError> {
		match map.write().get_mut(&id) {
			Some(entry) => {
				entry.last_seen = Some(instant);

				Ok(())
			},
			None => Err(StoreError::Backend { message: format!("unknown user `{id}`") }),
		}
	}
}
impl UserStore for MemoryUserStore {
	fn find_by_id<'a>(&'a self, id: &'a UserId) -> StoreFuture<'a, Option<UserRecord>> {
		let map = self.users.clone();
		let id = id.to_owned();

		Box::pin(async move { Ok(Self::find_now(map, id)) })
	}

	fn touch_last_seen<'a>(
		&'a self,
		id: &'a UserId,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, ()> {
		let map = self.users.clone();
		let id = id.to_owned();
		let injected = self.touch_failure.lock().clone();

		Box::pin(async move {
			match injected {
				Some(err) => Err(err),
				None => Self::touch_now(map, id, instant),
			}
		})
	}
}
