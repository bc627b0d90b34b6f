use rand::Rng;
use serde::{Deserialize, Serialize};

/// One predicted next term with its conditional probability.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Candidate {
	pub term: String,
	pub probability: f64,
}

/// Ranked result of a prediction.
///
/// Candidates are ordered by descending probability, ties broken by
/// ascending term. A term-sorted index over the same candidates answers
/// prefix queries with a binary search.
///
/// # Invariants
/// - `ranked` is sorted by (probability desc, term asc)
/// - `by_term` is a permutation of `0..ranked.len()` sorted by term
/// - Unfiltered probabilities sum to 1 unless the set is empty
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateSet {
	ranked: Vec<Candidate>,
	/// Indices into `ranked`, sorted by term.
	by_term: Vec<usize>,
}

impl CandidateSet {
	/// Returns a set with no candidates.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Builds a ranked set from raw counts out of a row totalling `total`.
	///
	/// Ranking compares counts rather than the divided probabilities, so
	/// equal counts always tie exactly.
	pub(crate) fn from_counts(mut counts: Vec<(String, u32)>, total: u64) -> Self {
		if total == 0 {
			return Self::empty();
		}

		counts.sort_by(|(term_a, count_a), (term_b, count_b)| {
			count_b.cmp(count_a).then_with(|| term_a.cmp(term_b))
		});
		let ranked: Vec<Candidate> = counts
			.into_iter()
			.map(|(term, count)| Candidate {
				term,
				probability: f64::from(count) / total as f64,
			})
			.collect();

		let mut by_term: Vec<usize> = (0..ranked.len()).collect();
		by_term.sort_unstable_by(|&a, &b| ranked[a].term.cmp(&ranked[b].term));

		Self { ranked, by_term }
	}

	/// Returns `(term, probability)` pairs whose term starts with `prefix`.
	///
	/// An empty prefix returns every candidate. Filtered results keep the
	/// ranking order and are not renormalized: probabilities stay relative
	/// to the whole row.
	pub fn terms(&self, prefix: &str) -> Vec<(&str, f64)> {
		self.filtered(prefix)
			.into_iter()
			.map(|candidate| (candidate.term.as_str(), candidate.probability))
			.collect()
	}

	/// Same as [`CandidateSet::terms`], returning the candidates themselves.
	pub fn filtered(&self, prefix: &str) -> Vec<&Candidate> {
		if prefix.is_empty() {
			return self.ranked.iter().collect();
		}

		// Terms sharing a prefix are contiguous in byte order
		let start = self.by_term.partition_point(|&i| self.ranked[i].term.as_str() < prefix);
		let mut hits: Vec<usize> = self.by_term[start..]
			.iter()
			.copied()
			.take_while(|&i| self.ranked[i].term.starts_with(prefix))
			.collect();
		hits.sort_unstable();

		hits.into_iter().map(|i| &self.ranked[i]).collect()
	}

	/// All candidates in ranking order.
	pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
		self.ranked.iter()
	}

	/// The `k` best candidates (fewer if the set is smaller).
	pub fn top(&self, k: usize) -> &[Candidate] {
		&self.ranked[..k.min(self.ranked.len())]
	}

	/// Probability of `term`, if it is a candidate.
	pub fn probability(&self, term: &str) -> Option<f64> {
		self.by_term
			.binary_search_by(|&i| self.ranked[i].term.as_str().cmp(term))
			.ok()
			.map(|index| self.ranked[self.by_term[index]].probability)
	}

	pub fn len(&self) -> usize {
		self.ranked.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ranked.is_empty()
	}

	/// Draws one candidate with probability proportional to its weight.
	///
	/// Returns `None` if the set is empty.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Candidate> {
		let total: f64 = self.ranked.iter().map(|candidate| candidate.probability).sum();
		if total <= 0.0 {
			return None;
		}

		let mut r = rng.random_range(0.0..total);
		for candidate in &self.ranked {
			if r < candidate.probability {
				return Some(candidate);
			}
			r -= candidate.probability;
		}

		// Rounding may leave a tiny remainder
		self.ranked.last()
	}
}

impl<'a> IntoIterator for &'a CandidateSet {
	type Item = &'a Candidate;
	type IntoIter = std::slice::Iter<'a, Candidate>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
