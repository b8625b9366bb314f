//! Error types for lanebench.
//!
//! Every failure this crate reports is a precondition violation detected before
//! timed measurement starts: mismatched buffers, out-of-range loop bounds, lane
//! widths that do not divide a length, bad configuration, or a fork child that
//! did not produce usable samples.

use std::fmt;

/// Errors that can occur while preparing or running a benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanebenchError {
    /// Two buffers that are processed pairwise have different lengths.
    LengthMismatch {
        /// Length of the first buffer.
        left: usize,
        /// Length of the second buffer.
        right: usize,
    },
    /// The configured loop bound exceeds the allocated buffer length.
    BoundExceedsLength {
        /// The configured loop bound.
        size: usize,
        /// The allocated buffer length.
        length: usize,
    },
    /// The buffer length is not a multiple of the vector lane count.
    UnalignedLength {
        /// The buffer length.
        length: usize,
        /// The lane count of the vector type.
        lanes: usize,
    },
    /// Memory allocation failed.
    AllocationError {
        /// The size that was requested to be allocated.
        requested_size: usize,
        /// The alignment that was requested.
        requested_alignment: usize,
        /// Human-readable error message.
        message: String,
    },
    /// Invalid layout parameters were provided.
    LayoutError {
        /// The size parameter that caused the error.
        size: usize,
        /// The alignment parameter that caused the error.
        alignment: usize,
        /// Human-readable error message.
        message: String,
    },
    /// A configuration knob was missing, unparsable or out of range.
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },
    /// A forked benchmark process failed or returned malformed output.
    ForkFailed {
        /// Human-readable error message.
        message: String,
    },
}

impl fmt::Display for LanebenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanebenchError::LengthMismatch { left, right } => write!(
                f,
                "Buffer length mismatch: {} != {} (paired buffers must share one length)",
                left, right
            ),
            LanebenchError::BoundExceedsLength { size, length } => write!(
                f,
                "Loop bound exceeds buffer: size {} > length {}",
                size, length
            ),
            LanebenchError::UnalignedLength { length, lanes } => write!(
                f,
                "Length {} is not a multiple of the {} lane vector width",
                length, lanes
            ),
            LanebenchError::AllocationError {
                requested_size,
                requested_alignment,
                message,
            } => write!(
                f,
                "Memory allocation failed: {} (requested {} bytes with {} byte alignment)",
                message, requested_size, requested_alignment
            ),
            LanebenchError::LayoutError {
                size,
                alignment,
                message,
            } => write!(
                f,
                "Invalid memory layout: {} (size: {}, alignment: {})",
                message, size, alignment
            ),
            LanebenchError::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            LanebenchError::ForkFailed { message } => {
                write!(f, "Forked benchmark failed: {}", message)
            }
        }
    }
}

impl std::error::Error for LanebenchError {}

/// Result type alias for lanebench operations.
pub type Result<T> = std::result::Result<T, LanebenchError>;

/// Creates a length mismatch error.
pub fn length_mismatch(left: usize, right: usize) -> LanebenchError {
    LanebenchError::LengthMismatch { left, right }
}

/// Creates a bound-exceeds-length error.
pub fn bound_exceeds_length(size: usize, length: usize) -> LanebenchError {
    LanebenchError::BoundExceedsLength { size, length }
}

/// Creates an unaligned length error.
pub fn unaligned_length(length: usize, lanes: usize) -> LanebenchError {
    LanebenchError::UnalignedLength { length, lanes }
}

/// Creates an allocation error.
pub fn allocation_error(size: usize, alignment: usize, message: impl Into<String>) -> LanebenchError {
    LanebenchError::AllocationError {
        requested_size: size,
        requested_alignment: alignment,
        message: message.into(),
    }
}

/// Creates a layout error.
pub fn layout_error(size: usize, alignment: usize, message: impl Into<String>) -> LanebenchError {
    LanebenchError::LayoutError {
        size,
        alignment,
        message: message.into(),
    }
}

/// Creates a configuration error.
pub fn invalid_config(message: impl Into<String>) -> LanebenchError {
    LanebenchError::InvalidConfig {
        message: message.into(),
    }
}

/// Creates a fork failure error.
pub fn fork_failed(message: impl Into<String>) -> LanebenchError {
    LanebenchError::ForkFailed {
        message: message.into(),
    }
}
