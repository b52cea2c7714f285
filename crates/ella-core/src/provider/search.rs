//! WebSearchProvider trait definition.

use ella_types::search::{SearchError, SearchRequest, SearchResponse};

/// A web search backend returning an answer, ranked results and images.
///
/// Implementations propagate provider errors unmodified; retrying is the
/// job runner's decision.
pub trait WebSearchProvider: Send + Sync {
    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl std::future::Future<Output = Result<SearchResponse, SearchError>> + Send;
}
