use thiserror::Error;

/// Domain failures that callers need to tell apart from plain storage
/// errors. These travel inside anyhow and are recovered with
/// `err.downcast_ref::<DomainError>()`.
#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Time entries already billed on another invoice: {entry_ids:?}")]
    AlreadyBilled { entry_ids: Vec<i64> },

    #[error("Invoice number space exhausted for year {year}")]
    AllocationExhausted { year: i32 },
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        DomainError::NotFound { entity, id }
    }
}
