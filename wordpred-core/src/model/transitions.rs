use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::context::StateKey;
use super::vocabulary::TermId;

/// Sparse transition counts keyed by `(state, next id)`.
///
/// Two representations coexist:
/// - a write-optimized nested map, updated by [`TransitionStore::record`]
/// - a read-optimized [`Snapshot`], built lazily on the first query after
///   a write and shared until the next write
///
/// `record` takes `&mut self`, so a write can never race a query. Queries
/// take `&self` and serialize the snapshot build behind an `RwLock`, which
/// lets a frozen store be queried from several threads at once.
///
/// # Invariants
/// - Every stored count is >= 1
/// - A cached snapshot always reflects every recorded transition
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct TransitionStore {
	/// state -> (next id -> occurrences)
	counts: HashMap<StateKey, HashMap<TermId, u32>>,
	/// `None` while dirty.
	#[serde(skip)]
	snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl TransitionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of `next` following `state`.
	///
	/// Discards any cached snapshot.
	pub fn record(&mut self, state: StateKey, next: TermId) {
		let count = self.counts.entry(state).or_default().entry(next).or_insert(0);
		*count = count.saturating_add(1);
		self.invalidate();
	}

	fn invalidate(&mut self) {
		*self.snapshot.get_mut().unwrap_or_else(PoisonError::into_inner) = None;
	}

	/// Returns `true` if a valid snapshot is cached.
	pub fn is_frozen(&self) -> bool {
		self.snapshot.read().unwrap_or_else(PoisonError::into_inner).is_some()
	}

	/// Returns the frozen snapshot, building it first if the store is dirty.
	pub fn snapshot(&self) -> Arc<Snapshot> {
		if let Some(snapshot) = self.snapshot.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
			return Arc::clone(snapshot);
		}

		let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
		// Another reader may have built it while we waited for the lock
		if let Some(snapshot) = guard.as_ref() {
			return Arc::clone(snapshot);
		}
		let snapshot = Arc::new(Snapshot::build(&self.counts));
		log::debug!(
			"Built transition snapshot: {} states, {} cells",
			snapshot.state_count(),
			snapshot.cell_count()
		);
		*guard = Some(Arc::clone(&snapshot));
		snapshot
	}

	/// Number of distinct states with at least one transition.
	pub fn state_count(&self) -> usize {
		self.counts.len()
	}

	/// Number of non-zero `(state, next id)` cells.
	pub fn cell_count(&self) -> usize {
		self.counts.values().map(HashMap::len).sum()
	}

	/// Sum of every recorded count.
	pub fn observation_count(&self) -> u64 {
		self.counts
			.values()
			.flat_map(HashMap::values)
			.map(|&count| u64::from(count))
			.sum()
	}

	/// Largest next id recorded, if any transition exists.
	pub fn max_next_id(&self) -> Option<TermId> {
		self.counts.values().flat_map(HashMap::keys).copied().max()
	}
}

/// Location of one row inside [`Snapshot::entries`].
#[derive(Clone, Copy, Debug)]
struct RowSpan {
	start: usize,
	len: usize,
	total: u64,
}

/// Immutable, row-oriented view of a [`TransitionStore`].
///
/// All rows are packed into one vector, each sorted by next id; a map
/// from state to span locates a row in O(1).
#[derive(Debug)]
pub struct Snapshot {
	rows: HashMap<StateKey, RowSpan>,
	entries: Vec<(TermId, u32)>,
}

impl Snapshot {
	/// Packs the nested counts. Cost is proportional to the number of cells.
	fn build(counts: &HashMap<StateKey, HashMap<TermId, u32>>) -> Self {
		let mut rows = HashMap::with_capacity(counts.len());
		let mut entries = Vec::with_capacity(counts.values().map(HashMap::len).sum());

		for (&state, transitions) in counts {
			let start = entries.len();
			entries.extend(transitions.iter().map(|(&next, &count)| (next, count)));
			entries[start..].sort_unstable_by_key(|&(next, _)| next);
			let total = transitions.values().map(|&count| u64::from(count)).sum();
			rows.insert(state, RowSpan { start, len: transitions.len(), total });
		}

		Self { rows, entries }
	}

	/// Returns the row of `state`; empty if the state was never seen.
	pub fn row(&self, state: StateKey) -> Row<'_> {
		match self.rows.get(&state) {
			Some(span) => Row {
				entries: &self.entries[span.start..span.start + span.len],
				total: span.total,
			},
			None => Row { entries: &[], total: 0 },
		}
	}

	pub fn state_count(&self) -> usize {
		self.rows.len()
	}

	pub fn cell_count(&self) -> usize {
		self.entries.len()
	}
}

/// All observed transitions out of one state.
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
	entries: &'a [(TermId, u32)],
	total: u64,
}

impl<'a> Row<'a> {
	/// `(next id, count)` pairs, sorted by next id, every count >= 1.
	pub fn entries(&self) -> &'a [(TermId, u32)] {
		self.entries
	}

	/// Sum of the row's counts.
	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Count of `next` in this row, 0 if absent.
	pub fn count(&self, next: TermId) -> u32 {
		self.entries
			.binary_search_by_key(&next, |&(id, _)| id)
			.map_or(0, |index| self.entries[index].1)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unknown_state_has_empty_row() {
		let store = TransitionStore::new();
		let snapshot = store.snapshot();
		let row = snapshot.row(42);
		assert!(row.is_empty());
		assert_eq!(row.total(), 0);
	}

	#[test]
	fn row_holds_counts_and_total() {
		let mut store = TransitionStore::new();
		store.record(7, 1);
		store.record(7, 3);
		store.record(7, 1);
		store.record(8, 1);

		let snapshot = store.snapshot();
		let row = snapshot.row(7);
		assert_eq!(row.entries(), &[(1, 2), (3, 1)]);
		assert_eq!(row.total(), 3);
		assert_eq!(row.count(1), 2);
		assert_eq!(row.count(2), 0);
		assert_eq!(snapshot.row(8).total(), 1);
	}

	#[test]
	fn write_invalidates_snapshot() {
		let mut store = TransitionStore::new();
		store.record(1, 1);
		assert!(!store.is_frozen());

		let before = store.snapshot();
		assert!(store.is_frozen());
		assert_eq!(before.row(1).total(), 1);

		store.record(1, 2);
		assert!(!store.is_frozen());
		let after = store.snapshot();
		assert_eq!(after.row(1).total(), 2);
		// The old snapshot is untouched
		assert_eq!(before.row(1).total(), 1);
	}

	#[test]
	fn snapshot_is_reused_while_frozen() {
		let mut store = TransitionStore::new();
		store.record(1, 1);
		let first = store.snapshot();
		let second = store.snapshot();
		assert!(Arc::ptr_eq(&first, &second));
	}

	#[test]
	fn statistics() {
		let mut store = TransitionStore::new();
		store.record(1, 1);
		store.record(1, 1);
		store.record(1, 2);
		store.record(5, 2);
		assert_eq!(store.state_count(), 2);
		assert_eq!(store.cell_count(), 3);
		assert_eq!(store.observation_count(), 4);
		assert_eq!(store.max_next_id(), Some(2));
		assert_eq!(TransitionStore::new().max_next_id(), None);

		let snapshot = store.snapshot();
		assert_eq!(snapshot.state_count(), 2);
		assert_eq!(snapshot.cell_count(), 3);
	}
}
