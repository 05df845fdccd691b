use thiserror::Error;

/// Fatal migration errors. Neither kind is retryable: the run aborts and the
/// operator resumes after fixing the configuration or the source snapshot.
/// Anything already created stays in place and is picked up again by
/// reconciliation on the next run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A mapping table is missing a required entry, e.g. an issue link type
    /// with no destination relationship name configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The tree references a source item that the freshly fetched project
    /// snapshot does not contain.
    #[error("referential integrity error: {0}")]
    ReferentialIntegrity(String),
}
