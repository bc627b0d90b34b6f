use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Dense identifier of a term, in `[0, capacity)`.
pub type TermId = u32;

/// Bidirectional mapping between terms and dense ids.
///
/// Ids are handed out sequentially in order of first appearance and are
/// never reassigned or removed. Once `capacity` ids exist, unseen terms
/// are refused.
///
/// # Invariants
/// - `terms.len() == ids.len() <= capacity`
/// - `ids[terms[i]] == i` for every assigned id
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Vocabulary {
	capacity: u32,
	/// Id to term, indexed by id.
	terms: Vec<String>,
	/// Term to id.
	ids: HashMap<String, TermId>,
}

impl Vocabulary {
	/// Creates an empty vocabulary holding at most `capacity` terms.
	pub fn new(capacity: u32) -> Self {
		Self {
			capacity,
			terms: Vec::new(),
			ids: HashMap::new(),
		}
	}

	/// Returns the id of `term`, assigning the next one if the term is new.
	///
	/// Returns `None` if the term is new and the vocabulary is full.
	pub fn assign_or_lookup(&mut self, term: &str) -> Option<TermId> {
		if let Some(&id) = self.ids.get(term) {
			return Some(id);
		}
		if self.is_full() {
			return None;
		}

		// Fits: len < capacity <= u32::MAX
		let id = self.terms.len() as TermId;
		self.terms.push(term.to_owned());
		self.ids.insert(term.to_owned(), id);
		Some(id)
	}

	/// Returns the id of `term` without assigning one.
	pub fn lookup(&self, term: &str) -> Option<TermId> {
		self.ids.get(term).copied()
	}

	/// Returns the term for `id`, or `None` if it was never assigned.
	pub fn term_of(&self, id: TermId) -> Option<&str> {
		self.terms.get(id as usize).map(String::as_str)
	}

	/// Number of assigned ids.
	pub fn len(&self) -> usize {
		self.terms.len()
	}

	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	pub fn capacity(&self) -> u32 {
		self.capacity
	}

	/// Returns `true` once no new term can be assigned.
	pub fn is_full(&self) -> bool {
		self.terms.len() >= self.capacity as usize
	}

	/// Checks that both directions of the mapping agree and fit the capacity.
	///
	/// Used on decoded models, which may come from a damaged file.
	pub fn check_consistency(&self) -> Result<(), String> {
		if self.terms.len() > self.capacity as usize {
			return Err(format!("{} terms exceed capacity {}", self.terms.len(), self.capacity));
		}
		if self.ids.len() != self.terms.len() {
			return Err(format!("{} ids for {} terms", self.ids.len(), self.terms.len()));
		}
		for (id, term) in self.terms.iter().enumerate() {
			if self.ids.get(term).map(|&found| found as usize) != Some(id) {
				return Err(format!("term {term:?} is not mapped to id {id}"));
			}
		}
		Ok(())
	}
}
