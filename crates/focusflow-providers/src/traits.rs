use async_trait::async_trait;
use focusflow_models::StudyAidKind;

use crate::error::ProviderError;

/// Everything the external generator gets to see: the active session's title
/// and the user's freeform notes, plus which aid to produce.
#[derive(Debug, Clone)]
pub struct StudyAidRequest {
    pub title: String,
    pub notes: String,
    pub kind: StudyAidKind,
}

/// Boundary to the external AI generation service.
///
/// The service is opaque to the engine beyond "accepts a title and freeform
/// context, returns text or fails". Implementations must not retry on their
/// own; failures are surfaced once and handled by the enrichment coordinator.
#[async_trait]
pub trait StudyAidProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn generate(&self, request: &StudyAidRequest) -> Result<String, ProviderError>;
}
