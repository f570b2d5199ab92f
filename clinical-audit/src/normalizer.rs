//! Converts raw submissions into canonical [`AnalysisRequest`] values.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::config::DEFAULT_MAX_AUDIO_BYTES;
use crate::error::{AuditError, AuditResult};
use crate::media::MediaBlob;
use crate::request::{is_audio_mime_type, AnalysisRequest};

/// Raw input as supplied by the host environment
#[derive(Debug, Clone)]
pub enum RawInput {
    /// Audio file on disk; the media type is sniffed when not given
    AudioFile { path: PathBuf, mime_type: Option<String> },
    /// Audio already held in memory
    AudioBytes { bytes: Vec<u8>, mime_type: String },
    /// Base64 audio, optionally as a `data:<mime>;base64,` URI
    EncodedAudio { payload: String, mime_type: Option<String> },
    Transcript { text: String },
}

/// Output of normalization: the request plus a playable copy of any audio.
#[derive(Debug, Clone)]
pub struct NormalizedInput {
    pub request: AnalysisRequest,
    pub media: Option<MediaBlob>,
}

#[derive(Debug, Clone)]
pub struct InputNormalizer {
    max_audio_bytes: usize,
}

impl Default for InputNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AUDIO_BYTES)
    }
}

impl InputNormalizer {
    pub fn new(max_audio_bytes: usize) -> Self {
        Self { max_audio_bytes }
    }

    pub fn max_audio_bytes(&self) -> usize {
        self.max_audio_bytes
    }

    /// # Errors
    ///
    /// `InputRead` when the audio cannot be read or decoded, `InvalidRequest`
    /// for oversized or non-audio media and blank transcripts.
    pub async fn normalize(&self, input: RawInput) -> AuditResult<NormalizedInput> {
        match input {
            RawInput::Transcript { text } => Ok(NormalizedInput {
                request: AnalysisRequest::text(text)?,
                media: None,
            }),
            RawInput::AudioFile { path, mime_type } => {
                let bytes = self.read_audio(&path).await?;
                let mime_type = match mime_type {
                    Some(mime) => mime,
                    None => resolve_mime_type(&path, &bytes)?,
                };
                self.encode(bytes, mime_type)
            }
            RawInput::AudioBytes { bytes, mime_type } => self.encode(bytes, mime_type),
            RawInput::EncodedAudio { payload, mime_type } => {
                let declared = data_uri_mime_type(&payload).map(str::to_string);
                let bytes = decode_audio(&payload)
                    .map_err(|e| AuditError::InputRead(format!("audio payload could not be decoded: {e}")))?;
                let mime_type = mime_type
                    .or(declared)
                    .or_else(|| sniff_mime_type(&bytes))
                    .ok_or_else(|| AuditError::InvalidRequest("audio media type could not be determined".to_string()))?;
                self.encode(bytes, mime_type)
            }
        }
    }

    async fn read_audio(&self, path: &Path) -> AuditResult<Vec<u8>> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| AuditError::InputRead(format!("{}: {e}", path.display())))?;
        if !metadata.is_file() {
            return Err(AuditError::InputRead(format!("{} is not a file", path.display())));
        }
        if usize::try_from(metadata.len()).map_or(true, |len| len > self.max_audio_bytes) {
            return Err(self.too_large(metadata.len()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AuditError::InputRead(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Read audio file");
        Ok(bytes)
    }

    fn encode(&self, bytes: Vec<u8>, mime_type: String) -> AuditResult<NormalizedInput> {
        if bytes.is_empty() {
            return Err(AuditError::InputRead("audio source contains no data".to_string()));
        }
        if bytes.len() > self.max_audio_bytes {
            return Err(self.too_large(bytes.len() as u64));
        }
        let mime_type = mime_type.trim().to_ascii_lowercase();
        if !is_audio_mime_type(&mime_type) {
            return Err(AuditError::InvalidRequest(format!(
                "unsupported media type `{mime_type}`; expected audio/*"
            )));
        }

        let request = AnalysisRequest::audio(encode_audio(&bytes), mime_type.clone())?;
        Ok(NormalizedInput {
            request,
            media: Some(MediaBlob::new(bytes, mime_type)),
        })
    }

    fn too_large(&self, len: u64) -> AuditError {
        AuditError::InvalidRequest(format!(
            "audio of {len} bytes exceeds the {} byte limit",
            self.max_audio_bytes
        ))
    }
}

pub fn encode_audio(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64 audio, tolerating a data-URI prefix.
///
/// # Errors
///
/// Returns the decoder error for invalid base64.
pub fn decode_audio(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(strip_data_uri(payload).trim())
}

/// Strip a `data:<mime>;base64,` prefix, leaving pure base64.
pub fn strip_data_uri(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some((_, data)) = payload.split_once(',') {
            return data;
        }
    }
    payload
}

fn data_uri_mime_type(payload: &str) -> Option<&str> {
    let header = payload.strip_prefix("data:")?.split_once(',')?.0;
    let mime = header.split(';').next()?;
    (!mime.is_empty()).then_some(mime)
}

fn sniff_mime_type(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|kind| kind.mime_type().to_string())
}

fn mime_type_for_extension(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        _ => return None,
    };
    Some(mime)
}

/// Sniffed audio type first, then the file extension. Containers such as
/// WebM sniff as video, so a non-audio sniff only wins without an extension.
fn resolve_mime_type(path: &Path, bytes: &[u8]) -> AuditResult<String> {
    let sniffed = sniff_mime_type(bytes);
    sniffed
        .clone()
        .filter(|mime| is_audio_mime_type(mime))
        .or_else(|| mime_type_for_extension(path).map(str::to_string))
        .or(sniffed)
        .ok_or_else(|| {
            AuditError::InvalidRequest(format!(
                "could not determine the media type of {}",
                path.display()
            ))
        })
}
