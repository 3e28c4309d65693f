pub mod admin_auth;
pub mod analysis;
pub mod media;
pub mod safety;
pub mod verification;

pub use admin_auth::{AdminAuthService, AuthFlowError};
pub use analysis::{AnalysisError, AnalysisService};
pub use media::{MediaError, MediaStore};
pub use safety::{SafetyAssessment, SafetyLevel};
