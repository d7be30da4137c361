use actix::MailboxError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

#[derive(Debug, Error)]
#[error("Failed to record state: {0}")]
pub struct RecorderError(pub String);

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Experiment {0} not found")]
    ExperimentNotFound(Uuid),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("{actor} actor unreachable: {source}")]
    Mailbox {
        actor: &'static str,
        #[source]
        source: MailboxError,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error while writing state store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize state store to JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}
