//! Image handling: source images, encoding, and editing providers.

pub mod encoder;
mod provider;
pub mod providers;
mod types;

pub use provider::ImageEditor;
pub use types::{
    is_image_media_type, EditMetadata, EditRequest, EditedImage, EncodedPayload, ImageFormat,
    SourceImage,
};
