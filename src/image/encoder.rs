//! Converts binary images into base64 payloads and data URLs.

use crate::error::{EditorError, Result};
use crate::image::types::{EncodedPayload, SourceImage};
use base64::Engine;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Reads `reader` to the end and renders the bytes as standard base64.
///
/// Any read failure, including an aborted read, maps to [`EditorError::Read`].
pub async fn encode_reader<R>(mut reader: R, mime_type: &str) -> Result<EncodedPayload>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| EditorError::Read(e.to_string()))?;

    Ok(EncodedPayload {
        data: base64::engine::general_purpose::STANDARD.encode(&bytes),
        mime_type: mime_type.to_string(),
    })
}

/// Encodes a source image for transport.
pub async fn encode(image: &SourceImage) -> Result<EncodedPayload> {
    encode_reader(image.data.as_slice(), &image.media_type).await
}

/// Encodes a source image as a data URL for display.
///
/// Runs independently of [`encode`]; the preview is never sent anywhere.
pub async fn preview(image: &SourceImage) -> Result<String> {
    let payload = encode(image).await?;
    Ok(to_data_url(&payload.mime_type, &payload.data))
}

/// Assembles a data URL from a media type and base64 text.
pub fn to_data_url(mime_type: &str, data: &str) -> String {
    format!("data:{mime_type};base64,{data}")
}

/// Strips a `data:<type>;base64,` prefix, if present, leaving the base64 text.
///
/// Text without a `data:` scheme is returned unchanged. A `data:` URL with
/// no comma separator is not interpretable and fails with [`EditorError::Read`].
pub fn strip_data_url_prefix(text: &str) -> Result<&str> {
    if !text.starts_with("data:") {
        return Ok(text);
    }
    text.split_once(',')
        .map(|(_, data)| data)
        .ok_or_else(|| EditorError::Read("malformed data URL: missing ',' separator".into()))
}

/// Decodes a payload back to raw bytes, as the receiving service would.
pub fn decode(payload: &EncodedPayload) -> Result<Vec<u8>> {
    let data = strip_data_url_prefix(&payload.data)?;
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| EditorError::Decode(e.to_string()))
}
