//! Editor state and its pure transition function.

use crate::image::{EditedImage, SourceImage};
use serde::{Deserialize, Serialize};

/// Message shown when generation is requested without an image or prompt.
pub const VALIDATION_MESSAGE: &str = "Please upload an image and enter a prompt.";

/// Lifecycle of the current generation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// No request has run since the last upload or reset.
    #[default]
    Idle,
    /// A request is outstanding.
    InFlight,
    /// The last request produced an image.
    Succeeded,
    /// The last request failed.
    Failed,
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::InFlight => write!(f, "in flight"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Tags an asynchronous job so its result can be matched to the state that
/// started it. Issued in strictly increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub(crate) u64);

impl Token {
    /// Returns the raw sequence number.
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Everything a transition can be driven by.
#[derive(Debug, Clone)]
pub enum Action {
    /// A new source image was selected.
    Upload {
        /// The replacement image.
        image: SourceImage,
        /// Token the preview for this image will carry.
        preview: Token,
    },
    /// A preview encoding finished.
    PreviewReady {
        /// Token issued with the upload.
        token: Token,
        /// Data URL, or the read error message.
        outcome: std::result::Result<String, String>,
    },
    /// The prompt text changed.
    PromptChanged(String),
    /// The user asked to generate.
    Generate {
        /// Token the result must carry to be accepted.
        token: Token,
    },
    /// A generation request finished.
    GenerationFinished {
        /// Token issued when the request started.
        token: Token,
        /// The edited image, or the user-facing error message.
        outcome: std::result::Result<EditedImage, String>,
    },
    /// Return to the initial configuration.
    Reset,
}

/// UI-facing editor state.
///
/// The default value is the initial configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorState {
    source: Option<SourceImage>,
    preview: Option<String>,
    prompt: String,
    result: Option<EditedImage>,
    error: Option<String>,
    request: RequestState,
    pending_preview: Option<Token>,
    pending_generation: Option<Token>,
}

impl EditorState {
    /// Creates the initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current source image.
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Data URL preview of the source image, once computed.
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// The current edit instruction.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The live generation result.
    pub fn result(&self) -> Option<&EditedImage> {
        self.result.as_ref()
    }

    /// The user-facing error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Lifecycle of the current request.
    pub fn request_state(&self) -> RequestState {
        self.request
    }

    /// True while a request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.request == RequestState::InFlight
    }

    /// Token of the generation whose result will be accepted, if any.
    pub fn pending_generation(&self) -> Option<Token> {
        self.pending_generation
    }

    /// Whether the generate action is currently available.
    ///
    /// Derived on every call and never stored.
    pub fn can_generate(&self) -> bool {
        !self.is_loading() && self.source.is_some() && !self.prompt.is_empty()
    }
}

/// Applies one action, producing the next state.
pub fn reduce(mut state: EditorState, action: Action) -> EditorState {
    match action {
        Action::Upload { image, preview } => {
            state.source = Some(image);
            state.preview = None;
            state.pending_preview = Some(preview);
            state.result = None;
            state.error = None;
            state.request = RequestState::Idle;
            state.pending_generation = None;
        }
        Action::PreviewReady { token, outcome } => {
            if state.pending_preview != Some(token) {
                tracing::debug!(token = token.get(), "discarding stale preview");
                return state;
            }
            state.pending_preview = None;
            match outcome {
                Ok(preview) => state.preview = Some(preview),
                Err(message) => state.error = Some(message),
            }
        }
        Action::PromptChanged(prompt) => {
            state.prompt = prompt;
        }
        Action::Generate { token } => {
            if state.source.is_none() || state.prompt.is_empty() {
                state.error = Some(VALIDATION_MESSAGE.to_string());
                return state;
            }
            if state.is_loading() {
                return state;
            }
            state.request = RequestState::InFlight;
            state.pending_generation = Some(token);
            state.result = None;
            state.error = None;
        }
        Action::GenerationFinished { token, outcome } => {
            if state.pending_generation != Some(token) {
                tracing::warn!(token = token.get(), "discarding stale generation result");
                return state;
            }
            state.pending_generation = None;
            match outcome {
                Ok(image) => {
                    state.result = Some(image);
                    state.request = RequestState::Succeeded;
                }
                Err(message) => {
                    state.error = Some(message);
                    state.request = RequestState::Failed;
                }
            }
        }
        Action::Reset => return EditorState::default(),
    }
    state
}
