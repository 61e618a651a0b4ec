//! Image editing providers.

mod gemini;

pub use gemini::{
    GeminiEditor, GeminiEditorBuilder, GeminiModel, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL,
};
