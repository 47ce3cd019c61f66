use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SugarError>;

#[derive(Error, Debug)]
pub enum SugarError {
    /// Input rejected before any state changed.
    #[error("{0}")]
    Validation(String),

    #[error("failed to persist {key}: {source:#}")]
    Persistence {
        key: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Not logged in. Use `sugarwise login` or `sugarwise register` first")]
    NotLoggedIn,
}

impl SugarError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Outcome of the durable half of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteOutcome {
    Persisted,
    Failed { key: &'static str, message: String },
}

impl WriteOutcome {
    pub(crate) fn from_save(key: &'static str, result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => Self::Persisted,
            Err(err) => {
                tracing::warn!(key, error = %format!("{err:#}"), "write failed; keeping in-memory state");
                Self::Failed {
                    key,
                    message: format!("{err:#}"),
                }
            }
        }
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }
}

/// A mutation that has already been applied to the in-memory cache, together with
/// the result of the write-back that followed it.
///
/// A failed write is never rolled back: `value` is visible to every later read in
/// this process even when `write` is [`WriteOutcome::Failed`].
#[derive(Debug, Clone)]
#[must_use]
pub struct Mutation<T> {
    pub value: T,
    pub write: WriteOutcome,
}

impl<T> Mutation<T> {
    pub(crate) fn new(value: T, write: WriteOutcome) -> Self {
        Self { value, write }
    }

    /// Collapse into a plain result, treating a failed write as a failed operation.
    pub fn into_result(self) -> Result<T> {
        match self.write {
            WriteOutcome::Persisted => Ok(self.value),
            WriteOutcome::Failed { key, message } => Err(SugarError::Persistence {
                key,
                source: anyhow::anyhow!(message),
            }),
        }
    }
}
