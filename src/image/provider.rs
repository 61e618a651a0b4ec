//! Image editor trait.

use crate::error::Result;
use crate::image::types::{EditRequest, EditedImage};
use async_trait::async_trait;

/// Trait for services that turn an image plus instruction into a new image.
///
/// Each call is a single attempt: implementations do not retry.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Sends one edit request and interprets the response.
    async fn edit(&self, request: &EditRequest) -> Result<EditedImage>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ImageEditor + ?Sized> ImageEditor for std::sync::Arc<T> {
    async fn edit(&self, request: &EditRequest) -> Result<EditedImage> {
        (**self).edit(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
