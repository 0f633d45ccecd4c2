use thiserror::Error;

pub type CgResult<T> = Result<T, CgError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CgError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: String },
}

impl CgError {
    pub fn invalid_arg(what: impl Into<String>) -> Self {
        CgError::InvalidArg { what: what.into() }
    }

    pub fn invariant(what: impl Into<String>) -> Self {
        CgError::Invariant { what: what.into() }
    }

    /// True for errors caused by the caller's input rather than by the graph's state.
    pub fn is_invalid_arg(&self) -> bool {
        matches!(self, CgError::InvalidArg { .. })
    }
}
