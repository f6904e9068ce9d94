use thiserror::Error;
use crate::word::Direction;

/// Error type for placements rejected by a [grid](crate::grid::Grid)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError
{
    #[error("Cannot place {term} at ({x}, {y}) going {direction:?}.")]
    CannotPlace { term: String, x: i32, y: i32, direction: Direction },
    #[error("{term} does not cross any placed word.")]
    MissingCrossing { term: String },
}

/// Error type for the outcomes of a generation that the caller has to handle.
///
/// Words without a legal placement are not errors, they are reported as unplaced in the outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError
{
    /// Not a single word could be placed.
    #[error("Generation failed, none of the {words} words could be placed.")]
    GenerationFailed { words: usize },
    /// Some words ended up in no cluster.
    #[error("Clustering left {missing} words unassigned.")]
    ClusteringIncomplete { missing: usize },
    /// Only produced when connectivity is enforced.
    #[error("Placed words form {components} disconnected groups.")]
    Disconnected { components: usize },
    #[error("Generation was cancelled.")]
    Cancelled,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// The generation panicked, the message is the panic payload when it is a string.
    #[error("Generation stopped unexpectedly: {0}")]
    Internal(String),
}

impl GenerationError
{
    /// Short stable identifier, used in the worker protocol
    #[must_use]
    pub fn code(&self) -> &'static str
    {
        match self
        {
            GenerationError::GenerationFailed { .. } => "generation_failed",
            GenerationError::ClusteringIncomplete { .. } => "clustering_incomplete",
            GenerationError::Disconnected { .. } => "disconnected",
            GenerationError::Cancelled => "cancelled",
            GenerationError::InvalidConfig(_) => "invalid_config",
            GenerationError::Internal(_) => "internal",
        }
    }
}

/// Error type for talking to a [worker](crate::worker::WorkerHandle)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkerError
{
    #[error("The worker is no longer accepting requests.")]
    Closed,
}
