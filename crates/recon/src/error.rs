use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error in an exception table document.
    #[error("exception table parse error: {0}")]
    TableParse(String),
    /// Exception table validation error (empty name, short duplicate set, repeated key).
    #[error("exception table validation error: {0}")]
    TableValidation(String),
    /// The reference store could not answer a query. Aborts the run.
    #[error("reference store error: {0}")]
    Reference(String),
}
