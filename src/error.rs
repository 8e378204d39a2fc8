use thiserror::Error;

/// Failures that end a run before any result table is exposed.
#[derive(Error, Debug)]
pub enum LuxError {
    /// Structurally invalid spectral table.
    #[error("Malformed spectral input: {0}")]
    MalformedInput(String),

    /// Two spectra share a name; names are row keys downstream.
    #[error("Duplicate spectrum name: '{0}'")]
    DuplicateName(String),

    #[error("Invalid spectrum selection: {0}")]
    InvalidSelection(String),

    #[error("Unknown quantity set: '{0}'")]
    UnknownQuantitySet(String),

    /// The colour-science engine failed or returned an unusable shape.
    #[error("Computation failed: {0}")]
    DomainComputation(String),

    #[error("Malformed photometric data: {0}")]
    MalformedPhotometry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LuxError {
    /// Wrap an engine error, keeping its whole context chain.
    pub fn computation(err: anyhow::Error) -> Self {
        LuxError::DomainComputation(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, LuxError>;
