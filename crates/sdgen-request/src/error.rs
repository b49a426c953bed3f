use thiserror::Error;

/// Reasons a pipeline refuses to run a [`crate::GenerationRequest`].
///
/// Raised by [`crate::GenerationPlan::resolve`]; building or editing a
/// request never fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("image_count must be at least 1")]
    ZeroImageCount,

    #[error("step_count must be at least 1")]
    ZeroStepCount,

    /// Only checked when a starting image is present.
    #[error("strength {strength} is outside [0.0, 1.0]")]
    StrengthOutOfRange { strength: f32 },

    #[error("pipeline has {expected} ControlNet model(s) but the request supplies {actual} input(s)")]
    ControlNetInputMismatch { expected: usize, actual: usize },

    #[error("{field} must be finite (got {value})")]
    NonFiniteValue { field: &'static str, value: f32 },
}
