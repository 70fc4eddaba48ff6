//! Decoding of inbound image payloads.
//!
//! Callers send the photo as base64, optionally wrapped in a
//! `data:image/<subtype>;base64,` URI. Both forms decode to the same bytes.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use thiserror::Error;

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Standard alphabet, padding optional. Browsers and hand-built payloads do
/// not always pad.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("no image data provided")]
    Empty,

    #[error("image data is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("decoded image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

/// A decoded photo plus the media type it is forwarded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSubmission {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageSubmission {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Normalize and decode an `imageData` string.
    ///
    /// A declared data-URI subtype wins; bare payloads are sniffed and fall
    /// back to `image/jpeg`.
    pub fn from_image_data(
        image_data: &str,
        max_bytes: usize,
    ) -> std::result::Result<Self, SubmissionError> {
        let (declared, payload) = split_data_uri(image_data.trim());

        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        if payload.is_empty() {
            return Err(SubmissionError::Empty);
        }

        // Reject obviously oversized input before allocating the decode buffer.
        let estimated = payload.len() / 4 * 3;
        if estimated > max_bytes.saturating_add(3) {
            return Err(SubmissionError::TooLarge {
                size: estimated,
                limit: max_bytes,
            });
        }

        let bytes = PAYLOAD_ENGINE
            .decode(payload.as_bytes())
            .map_err(|e| SubmissionError::InvalidBase64(e.to_string()))?;

        if bytes.is_empty() {
            return Err(SubmissionError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(SubmissionError::TooLarge {
                size: bytes.len(),
                limit: max_bytes,
            });
        }

        let mime_type = declared
            .or_else(|| detect_image_mime(&bytes).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        tracing::debug!(
            "Decoded image submission ({} bytes, {})",
            bytes.len(),
            mime_type
        );

        Ok(Self { bytes, mime_type })
    }
}

/// Split `data:image/<subtype>;base64,<payload>` into the declared media type
/// and the payload. Anything else is returned whole as the payload.
fn split_data_uri(input: &str) -> (Option<String>, &str) {
    let Some(rest) = input.strip_prefix("data:image/") else {
        return (None, input);
    };
    let Some((subtype, payload)) = rest.split_once(";base64,") else {
        return (None, input);
    };

    let valid_subtype = !subtype.is_empty()
        && subtype
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_subtype {
        return (None, input);
    }

    (Some(format!("image/{}", subtype.to_ascii_lowercase())), payload)
}

fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        _ => None,
    }
}
