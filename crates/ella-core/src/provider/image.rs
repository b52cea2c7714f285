//! ImageGenerator trait definition.

use ella_types::image::{ImageError, ImageGenerationRequest};

/// A text-to-image backend.
pub trait ImageGenerator: Send + Sync {
    /// Generate images and return their URLs in provider order.
    fn generate(
        &self,
        request: &ImageGenerationRequest,
    ) -> impl std::future::Future<Output = Result<Vec<String>, ImageError>> + Send;
}
