use rand::Rng;

use super::predictor::WordPredictor;
use crate::tokenize::{PUNCTUATION, is_sentence_end, tokenize};

impl WordPredictor {
	/// Continues `phrase` by repeatedly sampling the next term.
	///
	/// Each step predicts from the trailing context and draws one candidate
	/// with probability proportional to its weight. Generation stops after
	/// `max_words` terms, when no candidate is left, or right after a
	/// sentence terminator.
	///
	/// Returns only the generated terms, not the phrase itself.
	pub fn generate<R: Rng + ?Sized>(&self, phrase: &str, max_words: usize, rng: &mut R) -> Vec<String> {
		let mut context = tokenize(phrase);
		let start = context.len();

		while context.len() - start < max_words {
			let candidates = self.predict_tokens(&context);
			let Some(next) = candidates.sample(rng) else {
				break;
			};
			let done = is_sentence_end(&next.term);
			context.push(next.term.clone());
			if done {
				break;
			}
		}

		context.split_off(start)
	}
}

/// Renders tokens as text: words are space separated, punctuation sticks
/// to the preceding word.
pub fn join_tokens<S: AsRef<str>>(tokens: &[S]) -> String {
	let mut text = String::new();
	for token in tokens {
		let token = token.as_ref();
		let attached = token.chars().count() == 1 && token.chars().all(|c| PUNCTUATION.contains(&c));
		if !text.is_empty() && !attached {
			text.push(' ');
		}
		text.push_str(token);
	}
	text
}
