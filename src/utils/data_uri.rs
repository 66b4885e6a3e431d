//! Self-describing `data:<mime>;base64,<payload>` values.
//!
//! Every image that crosses a component boundary travels in this form so the
//! media type never gets separated from the bytes.

use std::fmt;

use base64::{engine::general_purpose, Engine as _};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("value is not a data URI")]
    MissingScheme,
    #[error("data URI is not base64 encoded")]
    NotBase64,
    #[error("data URI has no media type")]
    MissingMediaType,
    #[error("data URI payload is empty")]
    EmptyPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime_type: String,
    payload: String,
}

impl DataUri {
    pub fn new(mime_type: impl Into<String>, payload: impl Into<String>) -> Self {
        DataUri {
            mime_type: mime_type.into(),
            payload: payload.into(),
        }
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        DataUri::new(mime_type, general_purpose::STANDARD.encode(bytes))
    }

    pub fn parse(value: &str) -> Result<Self, DataUriError> {
        let rest = value
            .trim()
            .strip_prefix("data:")
            .ok_or(DataUriError::MissingScheme)?;
        let (meta, payload) = rest.split_once(',').ok_or(DataUriError::NotBase64)?;

        let mut params = meta.split(';');
        let mime_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !params.any(|param| param.trim().eq_ignore_ascii_case("base64")) {
            return Err(DataUriError::NotBase64);
        }
        if mime_type.is_empty() {
            return Err(DataUriError::MissingMediaType);
        }
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(DataUriError::EmptyPayload);
        }

        Ok(DataUri::new(mime_type, payload))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(self.payload.as_bytes())
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.payload)
    }
}
