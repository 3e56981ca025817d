use thiserror::Error;

/// Errors returned by [`CircularBuffer`](crate::CircularBuffer) operations.
///
/// Every variant is recoverable: the buffer is left exactly as it was before
/// the failing call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingBufferError {
    #[error("failed to allocate storage for {capacity} elements")]
    Memory { capacity: usize },

    #[error("buffer is empty")]
    Empty,

    #[error("capacity {requested} is below the minimum of {minimum}")]
    Capacity { requested: usize, minimum: usize },

    #[error("no visitor was supplied")]
    InvalidCallback,
}

impl RingBufferError {
    /// Numeric status for callers bridging to status-code interfaces.
    ///
    /// Success is reported as `0` by such interfaces; errors are negative.
    pub fn code(&self) -> i32 {
        match self {
            RingBufferError::Memory { .. } => -1,
            RingBufferError::Empty => -2,
            RingBufferError::Capacity { .. } => -3,
            RingBufferError::InvalidCallback => -4,
        }
    }
}

pub type Result<T> = std::result::Result<T, RingBufferError>;
