use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),

    /// Unique/foreign-key constraint violation. Kept as its own variant so
    /// callers can map it to a conflict without sniffing backend-specific
    /// message text.
    #[error("constraint violation: {0}")]
    Constraint(String),
}
