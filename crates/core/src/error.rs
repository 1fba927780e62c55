use serde::Serialize;

/// Failure classes reported in per-file scan outcomes.
///
/// An unparseable filename is not represented here: the path parser falls
/// back to season 0 and the file is treated as a movie, which is a valid
/// classification rather than a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The remote catalog had no matching series/season/episode/movie.
    /// Terminal for the file's chain; never retried.
    NotFound,

    /// Connection/timeout class failure, still within the retry budget.
    /// Once the budget is exhausted the failure is reported as
    /// `ResolutionFailed`.
    TransientNetwork,

    /// The response was missing an expected structural element or could
    /// not be parsed. Retrying cannot fix a shape mismatch.
    MalformedResponse,

    /// Terminal failure: retries exhausted, or the store rejected a write.
    ResolutionFailed,

    /// Two concurrent first-time upserts raced under one natural key.
    /// The store resolves this internally; the pipeline never reports it.
    PersistenceConflict,
}

impl FailureKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::TransientNetwork => "transient_network",
            Self::MalformedResponse => "malformed_response",
            Self::ResolutionFailed => "resolution_failed",
            Self::PersistenceConflict => "persistence_conflict",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
