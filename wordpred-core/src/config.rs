//! Construction parameters of a [`WordPredictor`](crate::WordPredictor).
//!
//! Build with [`PredictorConfig::new`] (validated) or load from the
//! environment with [`from_env`]. Unset variables fall back to
//! [`PredictorConfig::default`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable prefix (e.g. `WORDPRED_ORDER`).
pub const ENV_PREFIX: &str = "WORDPRED_";

pub const ENV_ORDER: &str = "ORDER";
pub const ENV_CASE_SENSITIVE: &str = "CASE_SENSITIVE";
pub const ENV_VOCAB_SIZE: &str = "VOCAB_SIZE";

pub const DEFAULT_ORDER: usize = 2;
pub const DEFAULT_CASE_SENSITIVE: bool = true;
pub const DEFAULT_VOCAB_SIZE: u32 = 10_000;

/// Predictor construction parameters.
///
/// # Invariants
/// - `order >= 1`
/// - `vocab_size >= 1`
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredictorConfig {
	/// Maximum number of preceding terms used as context.
	pub order: usize,
	/// When false, terms are lowercased before vocabulary lookup or assignment.
	pub case_sensitive: bool,
	/// Vocabulary capacity, also the radix of the state encoding.
	pub vocab_size: u32,
}

impl Default for PredictorConfig {
	fn default() -> Self {
		Self {
			order: DEFAULT_ORDER,
			case_sensitive: DEFAULT_CASE_SENSITIVE,
			vocab_size: DEFAULT_VOCAB_SIZE,
		}
	}
}

impl PredictorConfig {
	/// Creates a validated configuration.
	///
	/// # Errors
	/// Returns [`ConfigError::Validation`] if `order` or `vocab_size` is zero.
	pub fn new(order: usize, case_sensitive: bool, vocab_size: u32) -> Result<Self, ConfigError> {
		let config = Self { order, case_sensitive, vocab_size };
		config.validate()?;
		Ok(config)
	}

	/// Checks the invariants of the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.order == 0 {
			return Err(ConfigError::Validation("order must be greater than 0".to_owned()));
		}
		if self.vocab_size == 0 {
			return Err(ConfigError::Validation("vocab_size must be greater than 0".to_owned()));
		}
		Ok(())
	}

	/// Returns `true` when every state of length up to `order` fits in 64 bits.
	///
	/// Larger configurations still work, but state arithmetic wraps and
	/// distinct contexts may share a state.
	pub fn state_space_fits(&self) -> bool {
		u32::try_from(self.order)
			.ok()
			.and_then(|order| u64::from(self.vocab_size).checked_pow(order))
			.is_some()
	}
}

/// Errors produced when building or validating configuration.
///
/// # Variants
///
/// - **Validation**: a parameter is out of range (zero order or vocabulary size).
/// - **EnvVar**: an environment variable could not be read (e.g. invalid Unicode).
/// - **Parse**: an environment variable was set but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
	/// A parameter is out of range.
	Validation(String),

	/// Failed to read an environment variable.
	EnvVar {
		/// The full environment variable name.
		key: String,
		/// Underlying cause.
		message: String,
	},

	/// Environment variable was set but could not be parsed into the expected type.
	Parse {
		/// The full environment variable name.
		key: String,
		/// The raw value that failed to parse.
		value: String,
		/// Human-readable parse reason.
		message: String,
	},
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::Validation(m) => write!(f, "config validation: {m}"),
			ConfigError::EnvVar { key, message } => write!(f, "env var {key}: {message}"),
			ConfigError::Parse { key, value, message } => write!(f, "env var {key}={value:?}: {message}"),
		}
	}
}

impl std::error::Error for ConfigError {}

/// Returns the full environment variable key for a suffix (`ORDER` → `WORDPRED_ORDER`).
pub fn env_key(suffix: &str) -> String {
	format!("{ENV_PREFIX}{suffix}")
}

/// Reads an environment variable as a string.
///
/// `Ok(None)` if unset, `Err(ConfigError::EnvVar)` if set but not valid Unicode.
pub fn env_string(key: &str) -> Result<Option<String>, ConfigError> {
	match std::env::var(key) {
		Ok(s) => Ok(Some(s)),
		Err(std::env::VarError::NotPresent) => Ok(None),
		Err(e) => Err(ConfigError::EnvVar { key: key.to_owned(), message: e.to_string() }),
	}
}

/// Builds a [`PredictorConfig`] from `WORDPRED_*` environment variables.
///
/// Unset variables keep their default value; the result is validated.
pub fn from_env() -> Result<PredictorConfig, ConfigError> {
	from_source(env_string)
}

/// Builds a [`PredictorConfig`] from an arbitrary key/value source.
///
/// `lookup` receives full keys (`WORDPRED_ORDER`, ...) and returns the raw
/// value if present.
pub fn from_source<F>(lookup: F) -> Result<PredictorConfig, ConfigError>
where
	F: Fn(&str) -> Result<Option<String>, ConfigError>,
{
	let default = PredictorConfig::default();

	let order = parsed(&lookup, ENV_ORDER)?.unwrap_or(default.order);
	let case_sensitive = parsed(&lookup, ENV_CASE_SENSITIVE)?.unwrap_or(default.case_sensitive);
	let vocab_size = parsed(&lookup, ENV_VOCAB_SIZE)?.unwrap_or(default.vocab_size);

	PredictorConfig::new(order, case_sensitive, vocab_size)
}

fn parsed<T, F>(lookup: &F, suffix: &str) -> Result<Option<T>, ConfigError>
where
	T: std::str::FromStr,
	T::Err: fmt::Display,
	F: Fn(&str) -> Result<Option<String>, ConfigError>,
{
	let key = env_key(suffix);
	let Some(raw) = lookup(&key)? else {
		return Ok(None);
	};
	raw.trim().parse().map(Some).map_err(|e: T::Err| ConfigError::Parse {
		key,
		value: raw.clone(),
		message: e.to_string(),
	})
}
