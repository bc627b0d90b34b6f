use std::collections::VecDeque;

use super::vocabulary::TermId;

/// Integer encoding of a context of preceding term ids.
pub type StateKey = u64;

/// State of the empty context.
pub const EMPTY_STATE: StateKey = 0;

/// Encodes contexts as mixed-radix numbers with base `vocab_size`.
///
/// The most recent id is the most significant digit of a length-1 state;
/// every older id extends the state by one digit:
/// `state = state * vocab_size + id`.
///
/// Arithmetic wraps when `vocab_size^order` exceeds 64 bits, in which case
/// distinct contexts may share a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextEncoder {
	radix: u64,
}

impl ContextEncoder {
	pub fn new(vocab_size: u32) -> Self {
		Self { radix: u64::from(vocab_size) }
	}

	/// Extends `state` with one older id.
	pub fn extend(&self, state: StateKey, id: TermId) -> StateKey {
		state.wrapping_mul(self.radix).wrapping_add(u64::from(id))
	}

	/// Encodes a context given oldest to newest.
	///
	/// The empty context encodes to [`EMPTY_STATE`].
	pub fn encode(&self, ids: &[TermId]) -> StateKey {
		ids.iter().rev().fold(EMPTY_STATE, |state, &id| self.extend(state, id))
	}

	/// Returns the state of every context length `1..=ids.len()`.
	///
	/// `ids_newest_first` yields the preceding ids from the most recent one
	/// backwards; the `k`-th state returned covers the `k` most recent ids.
	pub fn states<I>(&self, ids_newest_first: I) -> impl Iterator<Item = StateKey>
	where
		I: IntoIterator<Item = TermId>,
	{
		let encoder = *self;
		ids_newest_first.into_iter().scan(EMPTY_STATE, move |state, id| {
			*state = encoder.extend(*state, id);
			Some(*state)
		})
	}
}

/// Sliding window over the most recent known term ids.
///
/// Holds at most `capacity` ids; pushing into a full window evicts the
/// oldest one.
#[derive(Clone, Debug)]
pub struct ContextWindow {
	ids: VecDeque<TermId>,
	capacity: usize,
}

impl ContextWindow {
	/// Creates an empty window. Nothing is allocated up front: the window
	/// never holds more ids than the text has tokens, whatever the order.
	pub fn new(capacity: usize) -> Self {
		Self { ids: VecDeque::new(), capacity }
	}

	pub fn push(&mut self, id: TermId) {
		if self.capacity == 0 {
			return;
		}
		if self.ids.len() == self.capacity {
			self.ids.pop_front();
		}
		self.ids.push_back(id);
	}

	/// Ids from the most recent backwards.
	pub fn newest_first(&self) -> impl Iterator<Item = TermId> + '_ {
		self.ids.iter().rev().copied()
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	pub fn clear(&mut self) {
		self.ids.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_context_is_zero() {
		let encoder = ContextEncoder::new(100);
		assert_eq!(encoder.encode(&[]), EMPTY_STATE);
	}

	#[test]
	fn newest_id_is_most_significant() {
		let encoder = ContextEncoder::new(100);
		// oldest 7, newest 3
		assert_eq!(encoder.encode(&[7, 3]), 3 * 100 + 7);
		assert_eq!(encoder.encode(&[5, 7, 3]), (3 * 100 + 7) * 100 + 5);
		assert_eq!(encoder.encode(&[3]), 3);
	}

	#[test]
	fn states_cover_every_length() {
		let encoder = ContextEncoder::new(10);
		let states: Vec<StateKey> = encoder.states([4, 2, 9]).collect();
		assert_eq!(states, vec![4, 42, 429]);
		assert_eq!(states[2], encoder.encode(&[9, 2, 4]));
	}

	#[test]
	fn overflow_wraps_instead_of_panicking() {
		let encoder = ContextEncoder::new(u32::MAX);
		let ids = [u32::MAX - 1; 4];
		let _ = encoder.encode(&ids);
	}

	#[test]
	fn window_keeps_most_recent_ids() {
		let mut window = ContextWindow::new(2);
		assert!(window.is_empty());
		window.push(1);
		window.push(2);
		window.push(3);
		assert_eq!(window.len(), 2);
		assert_eq!(window.newest_first().collect::<Vec<_>>(), vec![3, 2]);
		window.clear();
		assert!(window.is_empty());
	}

	#[test]
	fn huge_window_allocates_lazily() {
		let mut window = ContextWindow::new(usize::MAX);
		window.push(1);
		window.push(2);
		assert_eq!(window.newest_first().collect::<Vec<_>>(), vec![2, 1]);
	}
}
