//! Fixed-window counter kept in a sharded in-process map.
//!
//! Each key holds one [`RateWindow`]. A window opens on the first request after the
//! previous one has lapsed and admits up to `max_requests` until `reset_at`. Requests
//! straddling a boundary can therefore see up to twice the budget in a short burst; in
//! exchange each key costs a single counter.
//!
//! Every check runs under the shard lock for its key, so concurrent requests against one
//! key are serialized while unrelated keys proceed in parallel.

// crates.io
use dashmap::{DashMap, mapref::entry::Entry};
use time::PrimitiveDateTime;
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	governor::{GovernorFuture, RateDecision, RateGovernor, RateKey, RateLimit, RateWindow},
};

const LAST_INSTANT: OffsetDateTime = PrimitiveDateTime::MAX.assume_utc();

/// In-memory fixed-window [`RateGovernor`].
#[derive(Debug)]
pub struct FixedWindowGovernor {
	windows: DashMap<RateKey, RateWindow>,
	clock: Arc<dyn Clock>,
}
impl FixedWindowGovernor {
	/// Creates an empty governor reading time from `clock`.
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self { windows: DashMap::new(), clock }
	}

	/// Counts one request against `key` at `now`.
	pub fn admit_at(&self, key: &RateKey, limit: RateLimit, now: OffsetDateTime) -> RateDecision {
		match self.windows.entry(key.clone()) {
			Entry::Occupied(mut slot) => {
				let window = slot.get_mut();

				if now > window.reset_at {
					*window = open_window(now, limit);

					return first_in_window(window, limit, now);
				}
				if window.count >= limit.max_requests {
					return rejected(window, now);
				}

				window.count += 1;

				admitted(window, limit)
			},
			Entry::Vacant(slot) => {
				let window = open_window(now, limit);

				slot.insert(window);

				first_in_window(&window, limit, now)
			},
		}
	}

	/// Snapshot of the window currently stored for `key`.
	pub fn window(&self, key: &RateKey) -> Option<RateWindow> {
		self.windows.get(key).map(|window| *window)
	}

	/// Number of tracked keys.
	pub fn len(&self) -> usize {
		self.windows.len()
	}

	/// Returns `true` when no key is tracked.
	pub fn is_empty(&self) -> bool {
		self.windows.is_empty()
	}

	/// Drops windows that lapsed more than `grace` ago and returns how many were removed.
	///
	/// Lapsed windows are replaced on next access anyway, so sweeping only bounds memory.
	/// Each shard is locked while it is scanned, which keeps the sweep from interleaving
	/// with an `admit` on the same key. A `grace` reaching before the calendar range
	/// removes nothing.
	pub fn sweep(&self, grace: Duration) -> usize {
		let Some(cutoff) = self.clock.now().checked_sub(grace) else {
			return 0;
		};
		let mut removed = 0;

		self.windows.retain(|_, window| {
			let keep = window.reset_at >= cutoff;

			if !keep {
				removed += 1;
			}

			keep
		});

		removed
	}
}
impl Default for FixedWindowGovernor {
	fn default() -> Self {
		Self::new(Arc::new(SystemClock))
	}
}
impl RateGovernor for FixedWindowGovernor {
	fn admit<'a>(&'a self, key: &'a RateKey, limit: RateLimit) -> GovernorFuture<'a> {
		Box::pin(async move { Ok(self.admit_at(key, limit, self.clock.now())) })
	}
}

/// Opens a window counting the current request; a zero budget counts nothing.
///
/// A window reaching past the calendar range is clamped to its last instant.
fn open_window(now: OffsetDateTime, limit: RateLimit) -> RateWindow {
	let reset_at = now.checked_add(limit.window).unwrap_or(LAST_INSTANT);

	RateWindow { count: limit.max_requests.min(1), reset_at }
}

fn first_in_window(window: &RateWindow, limit: RateLimit, now: OffsetDateTime) -> RateDecision {
	if window.count == 0 { rejected(window, now) } else { admitted(window, limit) }
}

fn admitted(window: &RateWindow, limit: RateLimit) -> RateDecision {
	RateDecision::Admitted {
		remaining: limit.max_requests.saturating_sub(window.count),
		reset_at: window.reset_at,
	}
}

fn rejected(window: &RateWindow, now: OffsetDateTime) -> RateDecision {
	RateDecision::Rejected { retry_after: window.reset_at - now, reset_at: window.reset_at }
}
