//! Errors produced by the predictor.
//!
//! Data sparsity (full vocabulary, unknown context words, unseen contexts)
//! is never reported as an error. Only invalid construction parameters and
//! persistence failures reach callers through [`PredictorError`].

use std::fmt;

use crate::config::ConfigError;

/// Errors produced when building, saving or loading a predictor.
///
/// # Variants
///
/// - **Config**: construction parameters were rejected.
/// - **Io**: a corpus or model file could not be read or written.
/// - **Serialization**: a model could not be encoded or decoded with postcard.
#[derive(Debug)]
pub enum PredictorError {
	/// Invalid construction parameters.
	Config(ConfigError),

	/// Reading or writing a file failed.
	Io(std::io::Error),

	/// Encoding or decoding a persisted model failed.
	Serialization(postcard::Error),
}

impl fmt::Display for PredictorError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PredictorError::Config(e) => write!(f, "predictor: {e}"),
			PredictorError::Io(e) => write!(f, "predictor io: {e}"),
			PredictorError::Serialization(e) => write!(f, "predictor serialization: {e}"),
		}
	}
}

impl std::error::Error for PredictorError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			PredictorError::Config(e) => Some(e),
			PredictorError::Io(e) => Some(e),
			PredictorError::Serialization(e) => Some(e),
		}
	}
}

impl From<ConfigError> for PredictorError {
	fn from(e: ConfigError) -> Self {
		PredictorError::Config(e)
	}
}

impl From<std::io::Error> for PredictorError {
	fn from(e: std::io::Error) -> Self {
		PredictorError::Io(e)
	}
}

impl From<postcard::Error> for PredictorError {
	fn from(e: postcard::Error) -> Self {
		PredictorError::Serialization(e)
	}
}
