//! Error types for lobby-match.

use lobby_index::IndexError;
use thiserror::Error;

use crate::client::ClientId;

/// Result type for matching operations.
pub type Result<T> = std::result::Result<T, MatchError>;

/// Errors that abort a matching cycle.
///
/// Every variant except [`MatchError::IndexNotBuilt`] is a configuration
/// problem: retrying the same cycle against the same pool would fail the same
/// way. `IndexNotBuilt` means steps were called out of order. Empty pools,
/// empty candidate sets and partial teams are ordinary values, never errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    /// Team size must be at least one.
    #[error("invalid team size {0}: must be at least 1")]
    InvalidTeamSize(usize),

    /// A client's self-data does not follow the cycle's attribute schema.
    #[error("client {client} self-data {found:?} does not match schema {expected:?}")]
    SchemaMismatch {
        client: ClientId,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A client's searching-data is not prioritized in schema order.
    #[error("client {client} searching-data {found:?} does not match schema {expected:?}")]
    SearchMismatch {
        client: ClientId,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A tolerance is negative or not finite.
    #[error("client {client} has invalid tolerance {value} for {attribute}")]
    InvalidTolerance {
        client: ClientId,
        attribute: String,
        value: f64,
    },

    /// Candidate resolution ran before an index was built this cycle.
    #[error("candidate resolution requires a built index")]
    IndexNotBuilt,

    /// The spatial index rejected a point or query box.
    #[error("spatial index error: {0}")]
    Index(#[from] IndexError),
}

impl MatchError {
    /// Whether the error stems from configuration or client data shape.
    ///
    /// `IndexNotBuilt` is the only variant caused by call order instead.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, MatchError::IndexNotBuilt)
    }
}
