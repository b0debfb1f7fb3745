use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid TodoId: {0}")]
    InvalidTodoId(String),

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),
}

/// Store-level failures surfaced to callers of `TodoStore`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    #[error("{0}")]
    Validation(String),

    #[error("Todo not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Collects per-field failures and renders them as a single validation message.
#[derive(Debug, Default)]
pub(crate) struct ValidationErrors {
    failures: Vec<(&'static str, String)>,
}

impl ValidationErrors {
    pub(crate) fn add(&mut self, field: &'static str, reason: impl Into<String>) {
        self.failures.push((field, reason.into()));
    }

    pub(crate) fn into_result(self) -> Result<(), TodoError> {
        if self.failures.is_empty() {
            return Ok(());
        }

        let details = self
            .failures
            .iter()
            .map(|(field, reason)| format!("{field}: {reason}"))
            .collect::<Vec<_>>()
            .join(", ");

        Err(TodoError::Validation(format!(
            "Todo validation failed: {details}"
        )))
    }
}
