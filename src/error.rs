use thiserror::Error;

/// Construction-time failures (§7). The only error variant visible outside
/// the receive path; a filter that fails to construct is simply never
/// instantiated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing mandatory key '{0}'")]
    MissingKey(&'static str),

    #[error("key '{key}' has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("k={k} and m={m} out of range (both must be in 1..=255)")]
    OutOfRange { k: usize, m: usize },

    #[error("k+m={sum} exceeds 255")]
    SumTooLarge { sum: usize },

    #[error("unrecognized configuration key '{0}'")]
    UnknownKey(String),
}

/// RS codec failures. Confined to the receive path; see §7's
/// `DecodeFailure` taxonomy entry. Never panics or escapes the filter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{erasures} erasures exceed the {capacity}-symbol correction capacity")]
    TooManyErasures { erasures: usize, capacity: usize },

    #[error("erasure-position matrix was singular despite erasures <= m")]
    SingularMatrix,
}
