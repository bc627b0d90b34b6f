use std::borrow::Cow;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::candidates::CandidateSet;
use super::context::{ContextEncoder, ContextWindow, EMPTY_STATE, StateKey};
use super::transitions::TransitionStore;
use super::vocabulary::Vocabulary;
use crate::config::{ConfigError, PredictorConfig};
use crate::error::PredictorError;
use crate::io::{build_output_path, read_file};
use crate::tokenize::tokenize;

/// Word-level Markov chain predictor of order `N`.
///
/// Learning assigns vocabulary ids to terms and records, for each term,
/// one transition from every preceding context of length `1..=N`. This
/// trains all sub-orders at once, so a prediction can always use whatever
/// shorter context is available.
///
/// # Responsibilities
/// - Learn from raw text (`learn`) or pre-split tokens (`learn_tokens`)
/// - Predict ranked next terms from a phrase (`predict`)
/// - Persist and reload the learned model (`save`, `load`, `from_corpus`)
///
/// # Concurrency
/// Learning takes `&mut self` and prediction takes `&self`: callers that
/// share a predictor wrap it in an `RwLock` (or hand out `&self` only once
/// learning is done). Concurrent predictions share one cached snapshot.
#[derive(Serialize, Deserialize, Debug)]
pub struct WordPredictor {
	config: PredictorConfig,
	vocabulary: Vocabulary,
	transitions: TransitionStore,
	/// Whether vocabulary exhaustion was already logged.
	#[serde(skip)]
	reported_full: bool,
}

/// Size summary of a trained predictor.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelStats {
	/// Assigned vocabulary ids.
	pub terms: usize,
	/// Distinct context states with at least one transition.
	pub states: usize,
	/// Non-zero `(state, next term)` cells.
	pub cells: usize,
	/// Sum of all transition counts.
	pub observations: u64,
}

impl Default for WordPredictor {
	fn default() -> Self {
		Self::build(PredictorConfig::default())
	}
}

impl WordPredictor {
	/// Creates an empty predictor.
	///
	/// # Errors
	/// Returns an error if `order` or `vocab_size` is zero.
	pub fn new(config: PredictorConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		if !config.state_space_fits() {
			log::warn!(
				"vocab_size^order ({}^{}) exceeds 64 bits, distinct contexts may share a state",
				config.vocab_size,
				config.order
			);
		}
		Ok(Self::build(config))
	}

	fn build(config: PredictorConfig) -> Self {
		Self {
			vocabulary: Vocabulary::new(config.vocab_size),
			transitions: TransitionStore::new(),
			config,
			reported_full: false,
		}
	}

	pub fn config(&self) -> &PredictorConfig {
		&self.config
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn transitions(&self) -> &TransitionStore {
		&self.transitions
	}

	/// State encoder matching this predictor's vocabulary size.
	pub fn encoder(&self) -> ContextEncoder {
		ContextEncoder::new(self.config.vocab_size)
	}

	/// Applies case folding if the predictor is case-insensitive.
	pub fn fold<'a>(&self, term: &'a str) -> Cow<'a, str> {
		if self.config.case_sensitive {
			Cow::Borrowed(term)
		} else {
			Cow::Owned(term.to_lowercase())
		}
	}

	/// Tokenizes `text` and learns from it.
	///
	/// Returns the number of tokens that were learned.
	pub fn learn(&mut self, text: &str) -> usize {
		self.learn_tokens(&tokenize(text))
	}

	/// Learns from an already tokenized text.
	///
	/// The context window starts empty and spans the whole token sequence.
	/// Terms refused by a full vocabulary are skipped entirely: they record
	/// nothing and do not enter the context window.
	///
	/// Returns the number of tokens that were learned.
	pub fn learn_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> usize {
		let encoder = self.encoder();
		let mut window = ContextWindow::new(self.config.order);
		let mut learned = 0;

		for token in tokens {
			let term = self.fold(token.as_ref());
			let Some(id) = self.vocabulary.assign_or_lookup(&term) else {
				if !self.reported_full {
					log::warn!(
						"Vocabulary full ({} terms), unseen terms are no longer learned",
						self.vocabulary.capacity()
					);
					self.reported_full = true;
				}
				continue;
			};

			for state in encoder.states(window.newest_first()) {
				self.transitions.record(state, id);
			}
			window.push(id);
			learned += 1;
		}

		learned
	}

	/// Encodes the context formed by the last `order` tokens.
	///
	/// Tokens unknown to the vocabulary are skipped without being replaced,
	/// so the context shrinks instead of being padded. Returns `None` if no
	/// token of that context is known.
	pub fn context_state<S: AsRef<str>>(&self, tokens: &[S]) -> Option<StateKey> {
		let encoder = self.encoder();
		let mut state = EMPTY_STATE;
		let mut known = 0;

		for token in tokens.iter().rev().take(self.config.order) {
			if let Some(id) = self.vocabulary.lookup(&self.fold(token.as_ref())) {
				state = encoder.extend(state, id);
				known += 1;
			}
		}

		(known > 0).then_some(state)
	}

	/// Predicts the next term after `phrase`.
	///
	/// Returns an empty set when the phrase holds no known context or the
	/// context was never followed by anything.
	pub fn predict(&self, phrase: &str) -> CandidateSet {
		self.predict_tokens(&tokenize(phrase))
	}

	/// Predicts the next term after an already tokenized context.
	///
	/// Rebuilds the transition snapshot first if learning happened since
	/// the last query.
	pub fn predict_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> CandidateSet {
		let Some(state) = self.context_state(tokens) else {
			return CandidateSet::empty();
		};

		let snapshot = self.transitions.snapshot();
		let row = snapshot.row(state);
		let counts = row
			.entries()
			.iter()
			.filter_map(|&(id, count)| self.vocabulary.term_of(id).map(|term| (term.to_owned(), count)))
			.collect();

		CandidateSet::from_counts(counts, row.total())
	}

	/// Builds the query snapshot now instead of on the next prediction.
	pub fn freeze(&self) {
		self.transitions.snapshot();
	}

	pub fn stats(&self) -> ModelStats {
		ModelStats {
			terms: self.vocabulary.len(),
			states: self.transitions.state_count(),
			cells: self.transitions.cell_count(),
			observations: self.transitions.observation_count(),
		}
	}

	/// Writes the predictor to `path` in postcard format.
	///
	/// The query snapshot is not stored; it is rebuilt after loading.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PredictorError> {
		let bytes = postcard::to_stdvec(self)?;
		fs::write(path, bytes)?;
		Ok(())
	}

	/// Reads a predictor written by [`WordPredictor::save`].
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PredictorError> {
		let bytes = fs::read(path)?;
		let predictor: Self = postcard::from_bytes(&bytes)?;
		predictor.check_consistency()?;
		Ok(predictor)
	}

	/// Rejects decoded models whose parts disagree with their config.
	///
	/// Ids at or above `vocab_size` would break the state encoding, so the
	/// vocabulary capacity must equal the radix and every recorded id must
	/// belong to the vocabulary.
	fn check_consistency(&self) -> Result<(), ConfigError> {
		self.config.validate()?;
		if self.vocabulary.capacity() != self.config.vocab_size {
			return Err(ConfigError::Validation(format!(
				"vocabulary capacity {} differs from vocab_size {}",
				self.vocabulary.capacity(),
				self.config.vocab_size
			)));
		}
		self.vocabulary.check_consistency().map_err(ConfigError::Validation)?;
		if let Some(max) = self.transitions.max_next_id() {
			if max as usize >= self.vocabulary.len() {
				return Err(ConfigError::Validation(format!(
					"transition to id {max} outside the {} known terms",
					self.vocabulary.len()
				)));
			}
		}
		Ok(())
	}

	/// Loads a predictor trained on a corpus file, training it if needed.
	///
	/// - If `<stem>.bin` exists next to the corpus and was trained with
	///   the same `config`, it is loaded as is.
	/// - Otherwise every line of the corpus is learned as one text and the
	///   result is written to `<stem>.bin` for the next call.
	pub fn from_corpus<P: AsRef<Path>>(filepath: P, config: PredictorConfig) -> Result<Self, PredictorError> {
		let binary_path = build_output_path(&filepath, "bin")?;
		if binary_path.exists() {
			match Self::load(&binary_path) {
				Ok(predictor) if predictor.config == config => {
					log::info!("Loaded cached model {}", binary_path.display());
					return Ok(predictor);
				}
				Ok(_) => log::info!("Cached model {} has another config, retraining", binary_path.display()),
				Err(e) => log::warn!("Ignoring unreadable model {}: {e}", binary_path.display()),
			}
		}

		let mut predictor = Self::new(config)?;
		let lines = read_file(&filepath)?;
		let learned: usize = lines.iter().map(|line| predictor.learn(line)).sum();
		log::info!(
			"Trained on {} ({} lines, {} tokens, {} terms)",
			filepath.as_ref().display(),
			lines.len(),
			learned,
			predictor.vocabulary.len()
		);

		predictor.save(&binary_path)?;
		Ok(predictor)
	}
}
