// * The Refinery: record validation and quality assessment
// * Everything here is pure - no I/O, no clocks other than the injected
// * validation/assessment timestamps.

pub mod quality;
pub mod validator;

// * Re-exports for convenient access
pub use quality::{Grade, QualityAssessment, QualityScorer};
pub use validator::{FieldError, FieldErrorKind, Validator};
