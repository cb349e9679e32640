// THEORY:
// The `error` module defines the single failure taxonomy for the whole engine.
// Every numeric layer (matrix primitives, eigensolver, channel engine, 2D
// solver) reports through `PcaError`, so callers at the pipeline and worker
// boundaries only ever have to convert one type into a protocol error
// message. Variants map one-to-one onto the distinct ways a PCA run can be
// invalid: a bad component count, a degenerate image, a decomposition that
// refuses to converge, or floating-point noise pushing the 2D discriminant
// negative.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, PcaError>;

/// Errors that can occur while compressing or analyzing an image.
#[derive(Debug, Error, PartialEq)]
pub enum PcaError {
    /// Requested component count outside `[1, width]`.
    #[error("invalid component count: requested {requested}, valid range is 1..={max}")]
    InvalidComponentCount {
        /// The component count the caller asked for.
        requested: usize,
        /// The largest count this image admits.
        max: usize,
    },

    /// Zero width or zero height image.
    #[error("empty image: {width}x{height}")]
    EmptyImage {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// A single-row image has no sample variance (Bessel's correction
    /// divides by `height - 1`).
    #[error("insufficient samples: need at least 2 rows, got {rows}")]
    InsufficientSamples {
        /// Number of rows in the offending channel.
        rows: usize,
    },

    /// The eigendecomposition failed to produce a valid result.
    #[error("decomposition error: {0}")]
    Decomposition(String),

    /// The 2D solver's discriminant went negative beyond floating-point
    /// tolerance.
    #[error("numeric instability: discriminant {discriminant} is negative beyond tolerance")]
    NumericInstability {
        /// The offending discriminant value.
        discriminant: f64,
    },

    /// A sample buffer whose length disagrees with the stated dimensions.
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Length implied by the stated dimensions.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Matrix operands whose dimensions do not line up.
    #[error("dimension mismatch: left operand has {left} columns, right has {right} rows")]
    DimensionMismatch {
        /// Column count of the left operand.
        left: usize,
        /// Row count of the right operand.
        right: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_component_count_message() {
        let err = PcaError::InvalidComponentCount {
            requested: 0,
            max: 64,
        };
        assert_eq!(
            err.to_string(),
            "invalid component count: requested 0, valid range is 1..=64"
        );
    }

    #[test]
    fn empty_image_message() {
        let err = PcaError::EmptyImage {
            width: 0,
            height: 480,
        };
        assert_eq!(err.to_string(), "empty image: 0x480");
    }

    #[test]
    fn buffer_size_mismatch_message() {
        let err = PcaError::BufferSizeMismatch {
            expected: 16,
            actual: 12,
        };
        assert_eq!(err.to_string(), "buffer size mismatch: expected 16, got 12");
    }

    #[test]
    fn error_equality() {
        let a = PcaError::InsufficientSamples { rows: 1 };
        let b = PcaError::InsufficientSamples { rows: 1 };
        assert_eq!(a, b);
    }
}
