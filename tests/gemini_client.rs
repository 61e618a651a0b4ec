//! HTTP-level tests for the Gemini client and the controller driving it.

use gemedit::image::encoder;
use gemedit::{
    EditRequest, EditorController, EditorError, GeminiEditor, ImageEditor, RequestState,
    SourceImage,
};
use mockito::Matcher;
use serde_json::json;

const ENDPOINT: &str = "/models/gemini-2.5-flash-image:generateContent";

fn png_upload() -> SourceImage {
    // 10 bytes, PNG-typed
    SourceImage::new(
        vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x01],
        "image/png",
    )
    .unwrap()
}

fn editor_for(server: &mockito::ServerGuard) -> GeminiEditor {
    GeminiEditor::builder()
        .api_key("test-key")
        .base_url(server.url())
        .build()
        .unwrap()
}

async fn ready_controller(editor: GeminiEditor) -> EditorController<GeminiEditor> {
    let mut controller = EditorController::new(editor);
    controller.on_upload(png_upload()).await;
    controller.on_prompt_change("add stars");
    controller
}

#[tokio::test]
async fn test_generate_returns_data_url() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", ENDPOINT)
        .match_header("x-goog-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "candidates": [{
                    "content": {
                        "parts": [{"inlineData": {"mimeType": "image/png", "data": "QUJD"}}]
                    },
                    "finishReason": "STOP"
                }]
            }"#,
        )
        .expect(1)
        .create_async()
        .await;

    let mut controller = ready_controller(editor_for(&server)).await;
    let state = controller.on_generate().await;

    mock.assert_async().await;
    assert_eq!(state, RequestState::Succeeded);
    assert_eq!(
        controller.state().result().unwrap().data_url(),
        "data:image/png;base64,QUJD"
    );
    assert!(controller.state().error().is_none());
    assert!(!controller.state().is_loading());
}

#[tokio::test]
async fn test_request_body_has_image_then_prompt() {
    let mut server = mockito::Server::new_async().await;
    let payload = encoder::encode(&png_upload()).await.unwrap();

    let mock = server
        .mock("POST", ENDPOINT)
        .match_body(Matcher::PartialJson(json!({
            "contents": [{
                "parts": [
                    {"inlineData": {"mimeType": "image/png", "data": payload.data.clone()}},
                    {"text": "add stars"}
                ]
            }],
            "generationConfig": {"responseModalities": ["IMAGE"]}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "QUJD"}}]}}]}"#)
        .create_async()
        .await;

    let editor = editor_for(&server);
    let image = editor
        .edit(&EditRequest::new(payload, "add stars"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(image.to_bytes().unwrap(), b"ABC".to_vec());
}

#[tokio::test]
async fn test_safety_finish_reason_fails() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "candidates": [{"content": {"parts": [{"text": "no"}]}, "finishReason": "SAFETY"}],
                "promptFeedback": {"blockReason": "SAFETY"}
            }"#,
        )
        .create_async()
        .await;

    let mut controller = ready_controller(editor_for(&server)).await;
    let state = controller.on_generate().await;

    assert_eq!(state, RequestState::Failed);
    let error = controller.state().error().unwrap();
    assert!(error.contains("SAFETY"));
    assert!(error.contains("Please modify your prompt and try again."));
    assert!(controller.state().result().is_none());
}

#[tokio::test]
async fn test_missing_credential_fails_without_network_call() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let editor = GeminiEditor::builder()
        .api_key_env("GEMEDIT_TEST_NO_SUCH_KEY")
        .base_url(server.url())
        .build()
        .unwrap();
    let mut controller = ready_controller(editor).await;
    let state = controller.on_generate().await;

    mock.assert_async().await;
    assert_eq!(state, RequestState::Failed);
    assert_eq!(
        controller.state().error(),
        Some("GEMEDIT_TEST_NO_SUCH_KEY environment variable is not set.")
    );
}

#[tokio::test]
async fn test_zero_candidates_is_empty_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"candidates": []}"#)
        .create_async()
        .await;

    let mut controller = ready_controller(editor_for(&server)).await;
    let state = controller.on_generate().await;

    assert_eq!(state, RequestState::Failed);
    assert_eq!(
        controller.state().error(),
        Some(EditorError::EmptyResponse.to_string().as_str())
    );
}

#[tokio::test]
async fn test_http_error_propagates_raw() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", ENDPOINT)
        .with_status(500)
        .with_body("internal failure")
        .expect(1)
        .create_async()
        .await;

    let editor = editor_for(&server);
    let payload = encoder::encode(&png_upload()).await.unwrap();
    let err = editor
        .edit(&EditRequest::new(payload, "add stars"))
        .await
        .unwrap_err();

    match err {
        EditorError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "internal failure");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_transport_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", ENDPOINT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("not json")
        .create_async()
        .await;

    let editor = editor_for(&server);
    let payload = encoder::encode(&png_upload()).await.unwrap();
    let err = editor
        .edit(&EditRequest::new(payload, "add stars"))
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_empty_prompt_rejected_before_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let editor = editor_for(&server);
    let payload = encoder::encode(&png_upload()).await.unwrap();
    let err = editor
        .edit(&EditRequest::new(payload, ""))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, EditorError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_custom_model_in_path() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-3-pro-image-preview:generateContent")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/webp", "data": "QUJD"}}]}}]}"#)
        .expect(1)
        .create_async()
        .await;

    let editor = GeminiEditor::builder()
        .api_key("test-key")
        .model("pro")
        .base_url(server.url())
        .build()
        .unwrap();
    let mut controller = ready_controller(editor).await;
    assert_eq!(controller.on_generate().await, RequestState::Succeeded);

    mock.assert_async().await;
    let result = controller.state().result().unwrap();
    assert_eq!(result.mime_type, "image/webp");
    assert_eq!(
        result.metadata.model.as_deref(),
        Some("gemini-3-pro-image-preview")
    );
}

#[tokio::test]
async fn test_missing_credential_outcome_is_terminal() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let editor = GeminiEditor::builder()
        .api_key_env("GEMEDIT_TEST_NO_SUCH_KEY_SPLIT")
        .base_url(server.url())
        .build()
        .unwrap();
    let mut controller = ready_controller(editor).await;

    let job = controller.begin_generate().unwrap();
    let outcome = job.run(controller.editor()).await;
    let err = outcome.result.as_ref().unwrap_err();
    assert!(err.is_terminal());
    assert!(!err.is_transport());

    assert!(controller.finish_generate(outcome));
    mock.assert_async().await;
    assert_eq!(controller.state().request_state(), RequestState::Failed);
}
