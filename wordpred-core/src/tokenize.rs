//! Splitting raw text into terms.
//!
//! A token is either a maximal run of word characters or one of the
//! punctuation symbols in [`PUNCTUATION`]. Whitespace and any other ASCII
//! punctuation only separate tokens. Casing is left untouched: folding is
//! the predictor's job.

/// Punctuation symbols kept as standalone tokens.
pub const PUNCTUATION: [char; 5] = ['.', ',', '!', '?', ';'];

/// Symbols that end a sentence.
pub const SENTENCE_END: [&str; 3] = [".", "!", "?"];

/// Letters, digits, `_`, `'`, and non-ASCII symbols such as emoji.
fn is_word_char(c: char) -> bool {
	if c.is_ascii() {
		c.is_ascii_alphanumeric() || c == '_' || c == '\''
	} else {
		!c.is_whitespace()
	}
}

/// Splits `text` into word and punctuation tokens.
///
/// - UTF-8 safe: works on characters, never on bytes.
/// - Empty or whitespace-only input gives an empty vector.
pub fn tokenize(text: &str) -> Vec<String> {
	let mut tokens = Vec::new();
	let mut word = String::new();

	for c in text.chars() {
		if is_word_char(c) {
			word.push(c);
			continue;
		}
		if !word.is_empty() {
			tokens.push(std::mem::take(&mut word));
		}
		if PUNCTUATION.contains(&c) {
			tokens.push(c.to_string());
		}
	}
	if !word.is_empty() {
		tokens.push(word);
	}

	tokens
}

/// Returns `true` if `term` closes a sentence.
pub fn is_sentence_end(term: &str) -> bool {
	SENTENCE_END.contains(&term)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_words_and_punctuation() {
		assert_eq!(
			tokenize("Love all, trust a few, do wrong to none."),
			vec!["Love", "all", ",", "trust", "a", "few", ",", "do", "wrong", "to", "none", "."]
		);
	}

	#[test]
	fn drops_other_ascii_punctuation() {
		assert_eq!(tokenize("To be: that (is) it"), vec!["To", "be", "that", "is", "it"]);
	}

	#[test]
	fn keeps_apostrophes_inside_words() {
		assert_eq!(tokenize("don't stop"), vec!["don't", "stop"]);
	}

	#[test]
	fn keeps_non_ascii_symbols() {
		assert_eq!(tokenize("This is a test 👮"), vec!["This", "is", "a", "test", "👮"]);
		assert_eq!(tokenize("déjà vu!"), vec!["déjà", "vu", "!"]);
	}

	#[test]
	fn empty_input_has_no_tokens() {
		assert!(tokenize("").is_empty());
		assert!(tokenize("  \t\n").is_empty());
		assert!(tokenize("--- :: ---").is_empty());
	}

	#[test]
	fn preserves_case() {
		assert_eq!(tokenize("That that"), vec!["That", "that"]);
	}
}
