#![warn(missing_docs)]
//! gemedit - natural-language image editing backed by Gemini image models.
//!
//! The crate has three layers:
//!
//! - [`image::encoder`] turns a [`SourceImage`] into a base64 [`EncodedPayload`].
//! - [`GeminiEditor`] sends one image plus one instruction and interprets the reply.
//! - [`EditorController`] holds the UI-facing state and binds user actions to both.
//!
//! # Quick Start
//!
//! ```no_run
//! use gemedit::{EditorController, GeminiEditor, RequestState, SourceImage};
//!
//! #[tokio::main]
//! async fn main() -> gemedit::Result<()> {
//!     let editor = GeminiEditor::builder().build()?;
//!     let mut controller = EditorController::new(editor);
//!
//!     controller.on_upload(SourceImage::from_path("cat.png").await?).await;
//!     controller.on_prompt_change("Add a party hat");
//!
//!     if controller.on_generate().await == RequestState::Succeeded {
//!         if let Some(image) = controller.state().result() {
//!             image.save("cat-party.png").await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The API key is read from the `API_KEY` environment variable at request
//! time unless set on the builder.

pub mod controller;
mod error;
pub mod image;

// Re-export error types at crate root
pub use error::{EditorError, Result};

pub use controller::{
    EditorController, EditorState, GenerationJob, GenerationOutcome, RequestState,
};
pub use image::providers::{GeminiEditor, GeminiEditorBuilder, GeminiModel};
pub use image::{EditRequest, EditedImage, EncodedPayload, ImageEditor, ImageFormat, SourceImage};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::controller::{EditorController, RequestState};
    pub use crate::error::{EditorError, Result};
    pub use crate::image::providers::GeminiEditor;
    pub use crate::image::{EditedImage, ImageEditor, SourceImage};
}
