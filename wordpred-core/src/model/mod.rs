//! Top-level module for the word prediction model.
//!
//! This module provides a word-level Markov chain predictor, including:
//! - Term/id assignment (`Vocabulary`)
//! - Context state encoding (`ContextEncoder`, `ContextWindow`)
//! - Sparse transition counts and their frozen snapshot (`TransitionStore`)
//! - The high-level predictor (`WordPredictor`)
//! - Ranked, prefix-filterable results (`CandidateSet`)

/// Bounded bidirectional mapping between terms and dense ids.
pub mod vocabulary;

/// Mixed-radix encoding of preceding term ids into integer states.
///
/// Also provides the sliding window used while learning, which yields a
/// state for every context length at once.
pub mod context;

/// Sparse `(state, next id)` counts.
///
/// Mutable during learning, frozen into a row-oriented snapshot for queries.
pub mod transitions;

/// High-level predictor tying vocabulary, encoding and transitions together.
///
/// Handles learning, prediction, statistics and persistence.
pub mod predictor;

/// Ranked candidate sets and their prefix view.
pub mod candidates;

/// Random text generation by repeated sampling of candidates.
pub mod generator;

/// Top-k accuracy of a trained predictor on held-out text.
pub mod evaluation;
