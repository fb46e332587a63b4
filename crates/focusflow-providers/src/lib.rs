pub mod error;
pub mod gemini;
pub mod prompt;
pub mod traits;

pub use error::ProviderError;
pub use gemini::{GeminiProvider, GEMINI_DEFAULT_BASE_URL};
pub use traits::{StudyAidProvider, StudyAidRequest};
