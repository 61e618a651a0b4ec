//! Application state controller.
//!
//! [`EditorController`] binds the four user actions (upload, prompt change,
//! generate, reset) to the encoder and an [`ImageEditor`], keeping all state
//! in an [`EditorState`] that only [`reduce`] mutates.
//!
//! Generation can be driven in one call with [`EditorController::on_generate`],
//! or split into [`begin_generate`](EditorController::begin_generate),
//! [`GenerationJob::run`] and [`finish_generate`](EditorController::finish_generate)
//! when the caller runs the request on its own task. Results whose token is no
//! longer pending (after a reset or a new upload) are discarded.

mod state;

pub use state::{reduce, Action, EditorState, RequestState, Token, VALIDATION_MESSAGE};

use crate::error::EditorError;
use crate::image::{encoder, EditRequest, EditedImage, ImageEditor, SourceImage};

/// A generation request detached from the controller.
#[derive(Debug, Clone)]
#[must_use = "a started generation must be run and finished"]
pub struct GenerationJob {
    token: Token,
    image: SourceImage,
    prompt: String,
}

impl GenerationJob {
    /// The token this job's result will be matched against.
    pub fn token(&self) -> Token {
        self.token
    }

    /// Encodes the image and sends it, in sequence.
    pub async fn run<E: ImageEditor + ?Sized>(self, editor: &E) -> GenerationOutcome {
        let Self {
            token,
            image,
            prompt,
        } = self;
        let result = async {
            let payload = encoder::encode(&image).await?;
            editor.edit(&EditRequest::new(payload, prompt)).await
        }
        .await;

        GenerationOutcome { token, result }
    }
}

/// The finished result of a [`GenerationJob`].
#[derive(Debug)]
pub struct GenerationOutcome {
    /// Token of the job that produced this outcome.
    pub token: Token,
    /// The edited image or the failure.
    pub result: crate::Result<EditedImage>,
}

/// A preview encoding detached from the controller.
#[derive(Debug, Clone)]
pub struct PreviewJob {
    token: Token,
    image: SourceImage,
}

impl PreviewJob {
    /// Computes the preview data URL.
    pub async fn run(self) -> Action {
        let outcome = encoder::preview(&self.image)
            .await
            .map_err(|e| e.to_string());
        Action::PreviewReady {
            token: self.token,
            outcome,
        }
    }
}

/// Owns the editor state and drives it from user and network events.
pub struct EditorController<E> {
    editor: E,
    state: EditorState,
    last_token: u64,
}

impl<E: ImageEditor> EditorController<E> {
    /// Creates a controller in its initial configuration.
    pub fn new(editor: E) -> Self {
        Self {
            editor,
            state: EditorState::new(),
            last_token: 0,
        }
    }

    /// The current state, for rendering.
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    /// The editor requests are sent through.
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Whether the generate action is available.
    pub fn can_generate(&self) -> bool {
        self.state.can_generate()
    }

    /// Applies an action to the state.
    pub fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    fn next_token(&mut self) -> Token {
        self.last_token += 1;
        Token(self.last_token)
    }

    /// Replaces the source image and returns the job that computes its preview.
    pub fn begin_upload(&mut self, image: SourceImage) -> PreviewJob {
        let token = self.next_token();
        tracing::debug!(
            media_type = %image.media_type,
            size = image.size(),
            "source image selected"
        );
        self.dispatch(Action::Upload {
            image: image.clone(),
            preview: token,
        });
        PreviewJob { token, image }
    }

    /// Replaces the source image and stores its preview.
    pub async fn on_upload(&mut self, image: SourceImage) {
        let job = self.begin_upload(image);
        let ready = job.run().await;
        self.dispatch(ready);
    }

    /// Replaces the prompt verbatim.
    pub fn on_prompt_change(&mut self, prompt: impl Into<String>) {
        self.dispatch(Action::PromptChanged(prompt.into()));
    }

    /// Marks a generation as in flight and returns the work to perform.
    ///
    /// Returns `None` when generation is unavailable; a missing image or
    /// prompt also sets the validation error.
    pub fn begin_generate(&mut self) -> Option<GenerationJob> {
        let token = self.next_token();
        self.dispatch(Action::Generate { token });
        if self.state.pending_generation() != Some(token) {
            return None;
        }
        let image = self.state.source()?.clone();
        Some(GenerationJob {
            token,
            image,
            prompt: self.state.prompt().to_string(),
        })
    }

    /// Records a finished generation.
    ///
    /// Returns false if the outcome was stale and discarded.
    pub fn finish_generate(&mut self, outcome: GenerationOutcome) -> bool {
        let accepted = self.state.pending_generation() == Some(outcome.token);
        let result = outcome.result.map_err(|e| {
            if accepted {
                log_failure(&e);
            }
            e.to_string()
        });
        self.dispatch(Action::GenerationFinished {
            token: outcome.token,
            outcome: result,
        });
        accepted
    }

    /// Runs one generation end to end and returns the resulting request state.
    pub async fn on_generate(&mut self) -> RequestState {
        let Some(job) = self.begin_generate() else {
            return self.state.request_state();
        };
        let outcome = job.run(&self.editor).await;
        self.finish_generate(outcome);
        self.state.request_state()
    }

    /// Returns to the initial configuration.
    pub fn on_reset(&mut self) {
        self.dispatch(Action::Reset);
    }
}

fn log_failure(error: &EditorError) {
    if error.is_transport() {
        tracing::error!(error = %error, "image edit request failed");
    } else {
        tracing::error!(error = %error, "image edit produced no image");
    }
}
