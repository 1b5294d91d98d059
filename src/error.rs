//! Error types for the dispatch engine
//!
//! Dispatching an event never fails. These errors only come from setting a
//! machine up: building it, parsing an event catalog or loading registers.

use thiserror::Error;

/// Result type alias for configuration and setup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring a state machine
#[derive(Error, Debug)]
pub enum Error {
    /// The builder was asked to build without an initial state
    #[error("State machine has no initial state")]
    MissingInitialState,

    /// An event definition line could not be parsed
    #[error("line {line}: malformed event definition `{text}`")]
    MalformedEvent {
        /// Line number in the definition text
        line: usize,
        /// Offending logical line
        text: String,
    },

    /// An event name was defined more than once
    #[error("line {line}: event {name} already exists")]
    DuplicateEvent {
        /// Line number in the definition text
        line: usize,
        /// Duplicated event name
        name: String,
    },

    /// A multi-event count was not an integer
    #[error("line {line}: multi definition must be an integer count, got `{count}`")]
    BadMultiCount {
        /// Line number in the definition text
        line: usize,
        /// Text found between the brackets
        count: String,
    },

    /// A continuation line appeared before any definition
    #[error("line {0}: continuation line with no start")]
    OrphanContinuation(usize),

    /// The catalog would need more identities than fit in an event id
    #[error("too many events defined ({0}), at most 256 fit in an event id")]
    TooManyEvents(usize),

    /// Register configuration was not valid JSON for the register set
    #[error("invalid register configuration: {0}")]
    RegisterConfig(#[from] serde_json::Error),
}
