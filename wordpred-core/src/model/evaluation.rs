use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use super::predictor::WordPredictor;
use crate::tokenize::tokenize;

/// Chunks per CPU when splitting texts across worker threads.
const CHUNK_FACTOR: usize = 4;

/// Hit counts of a top-k evaluation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Evaluation {
	/// Tokens found among the top-k candidates.
	pub correct: usize,
	/// Tokens evaluated.
	pub total: usize,
}

impl Evaluation {
	/// Share of correct predictions, 0 when nothing was evaluated.
	pub fn accuracy(&self) -> f64 {
		if self.total == 0 {
			0.0
		} else {
			self.correct as f64 / self.total as f64
		}
	}

	fn merge(&mut self, other: Evaluation) {
		self.correct += other.correct;
		self.total += other.total;
	}
}

/// Measures how often the next token is among the `top_k` predictions.
///
/// Every token of every text counts once; its context is the `order`
/// tokens before it in the same text. Texts are spread over worker
/// threads that share one frozen snapshot of the predictor.
pub fn evaluate<S>(predictor: &WordPredictor, texts: &[S], top_k: usize) -> Evaluation
where
	S: AsRef<str> + Sync,
{
	if texts.is_empty() {
		return Evaluation::default();
	}

	// Build once up front instead of racing for it in every worker
	predictor.freeze();

	let chunks = num_cpus::get() * CHUNK_FACTOR;
	let chunk_size = texts.len().div_ceil(chunks);
	log::debug!("Evaluating {} texts in chunks of {}", texts.len(), chunk_size);

	let (tx, rx) = mpsc::channel();
	thread::scope(|scope| {
		for chunk in texts.chunks(chunk_size) {
			let tx = tx.clone();
			scope.spawn(move || {
				let mut partial = Evaluation::default();
				for text in chunk {
					partial.merge(evaluate_text(predictor, text.as_ref(), top_k));
				}
				// The receiver outlives the scope
				let _ = tx.send(partial);
			});
		}
	});
	drop(tx);

	let mut evaluation = Evaluation::default();
	for partial in rx.iter() {
		evaluation.merge(partial);
	}
	log::info!(
		"Top-{} accuracy: {} / {} ({:.2}%)",
		top_k,
		evaluation.correct,
		evaluation.total,
		evaluation.accuracy() * 100.0
	);
	evaluation
}

/// Evaluates a single text.
pub fn evaluate_text(predictor: &WordPredictor, text: &str, top_k: usize) -> Evaluation {
	let tokens: Vec<String> = tokenize(text)
		.iter()
		.map(|token| predictor.fold(token).into_owned())
		.collect();
	let order = predictor.config().order;

	let mut evaluation = Evaluation::default();
	for (i, token) in tokens.iter().enumerate() {
		let context = &tokens[i.saturating_sub(order)..i];
		let candidates = predictor.predict_tokens(context);
		if candidates.top(top_k).iter().any(|candidate| &candidate.term == token) {
			evaluation.correct += 1;
		}
		evaluation.total += 1;
	}
	evaluation
}

/// Splits `items` into a training head and a test tail.
///
/// The head holds `floor(len * train_ratio)` items; the ratio is clamped
/// to `[0, 1]`.
pub fn split_train_test<T>(items: &[T], train_ratio: f64) -> (&[T], &[T]) {
	let ratio = train_ratio.clamp(0.0, 1.0);
	let head = ((items.len() as f64) * ratio).floor() as usize;
	items.split_at(head.min(items.len()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::PredictorConfig;

	const TEXT: &str = "the cat sat on the mat.";

	fn trained() -> WordPredictor {
		let mut predictor =
			WordPredictor::new(PredictorConfig { order: 2, case_sensitive: true, vocab_size: 100 }).unwrap();
		predictor.learn(TEXT);
		predictor
	}

	#[test]
	fn counts_hits_in_one_text() {
		let predictor = trained();
		// Only the first token has no context
		assert_eq!(evaluate_text(&predictor, TEXT, 1), Evaluation { correct: 6, total: 7 });
	}

	#[test]
	fn parallel_sum_matches_sequential() {
		let predictor = trained();
		let texts: Vec<&str> = vec![TEXT; 50];
		let evaluation = evaluate(&predictor, &texts, 1);
		assert_eq!(evaluation, Evaluation { correct: 300, total: 350 });
		assert!((evaluation.accuracy() - 6.0 / 7.0).abs() < 1e-12);
	}

	#[test]
	fn unknown_text_scores_zero() {
		let predictor = trained();
		let evaluation = evaluate(&predictor, &["dogs bark loudly"], 3);
		assert_eq!(evaluation, Evaluation { correct: 0, total: 3 });
	}

	#[test]
	fn empty_input() {
		let predictor = trained();
		let evaluation = evaluate::<&str>(&predictor, &[], 3);
		assert_eq!(evaluation.total, 0);
		assert_eq!(evaluation.accuracy(), 0.0);
	}

	#[test]
	fn split_keeps_order() {
		let items = [1, 2, 3, 4, 5, 6, 7, 8];
		let (train, test) = split_train_test(&items, 0.75);
		assert_eq!(train, &[1, 2, 3, 4, 5, 6]);
		assert_eq!(test, &[7, 8]);

		let (train, test) = split_train_test(&items, 2.0);
		assert_eq!(train.len(), 8);
		assert!(test.is_empty());
	}
}
