//! Next-word prediction library.
//!
//! This crate provides a word-level Markov chain predictor including:
//! - A bounded vocabulary mapping terms to dense ids
//! - Mixed-radix encoding of n-gram contexts into integer states
//! - A sparse transition store with a frozen, read-optimized snapshot
//! - Ranked candidate sets with prefix filtering
//! - Random generation and top-k accuracy evaluation on top of the model
//!
//! Corpus file handling is kept internal; everything else needed to train,
//! query, persist and evaluate a predictor is exposed.

/// Predictor models and the algorithms built on them.
///
/// Exposes `WordPredictor` and `CandidateSet`, along with the lower-level
/// vocabulary, context and transition components they are built from.
pub mod model;

/// Splitting raw text into word and punctuation tokens.
pub mod tokenize;

/// Predictor configuration (construction parameters, env loading).
pub mod config;

/// Error types shared by the crate.
pub mod error;

/// I/O utilities (corpus loading, path helpers).
///
/// Only `list_files` is re-exported for the binaries.
pub(crate) mod io;

pub use config::PredictorConfig;
pub use error::PredictorError;
pub use io::list_files;
pub use model::candidates::{Candidate, CandidateSet};
pub use model::predictor::{ModelStats, WordPredictor};
