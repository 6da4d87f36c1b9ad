use std::fmt;

/// Which of the buffers taking part in a merge cycle a [`HdrError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    Low,
    Mid,
    High,
    Output,
}

impl fmt::Display for Exposure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exposure::Low => write!(f, "low exposure"),
            Exposure::Mid => write!(f, "mid exposure"),
            Exposure::High => write!(f, "high exposure"),
            Exposure::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HdrError {
    #[error("MissingInput: {0}")]
    MissingInput(Exposure),

    #[error("InconsistentResolutions: {which} is {actual:?}, expected {expected:?}")]
    InconsistentResolutions {
        which: Exposure,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("InvalidDimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("BufferSizeMismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("InvalidConfig: {0}")]
    InvalidConfig(&'static str),

    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}
