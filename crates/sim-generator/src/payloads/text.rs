//! Constant text and inline byte payloads.

use super::{BuiltPayload, PayloadBuilder};
use crate::preview::{preview_payload, PreviewSource};
use base64::Engine;
use sim_core::{Result, SimError};
use std::str::FromStr;

/// Publishes the same UTF-8 text every time.
#[derive(Debug, Clone)]
pub struct TextPayloadBuilder {
    value: String,
    preview: String,
}

impl TextPayloadBuilder {
    pub fn new(value: String) -> Self {
        let preview = preview_payload(PreviewSource::Text(&value));
        Self { value, preview }
    }
}

impl PayloadBuilder for TextPayloadBuilder {
    fn build(&mut self) -> Result<BuiltPayload> {
        Ok(BuiltPayload {
            bytes: self.value.as_bytes().to_vec(),
            preview: self.preview.clone(),
        })
    }
}

/// How the `value` of a bytes payload is written in the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytesEncoding {
    Utf8,
    Hex,
    Base64,
}

impl FromStr for BytesEncoding {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "utf8" => Ok(BytesEncoding::Utf8),
            "hex" => Ok(BytesEncoding::Hex),
            "base64" => Ok(BytesEncoding::Base64),
            _ => Err(SimError::payload(
                "bytes payload encoding must be utf8, hex, or base64",
            )),
        }
    }
}

impl BytesEncoding {
    /// Decode the configured text into raw bytes.
    pub fn decode(self, value: &str) -> Result<Vec<u8>> {
        let compact = || value.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        match self {
            BytesEncoding::Utf8 => Ok(value.as_bytes().to_vec()),
            BytesEncoding::Hex => hex::decode(compact())
                .map_err(|e| SimError::payload(format!("bytes payload decoding failed: {e}"))),
            BytesEncoding::Base64 => base64::engine::general_purpose::STANDARD
                .decode(compact())
                .map_err(|e| SimError::payload(format!("bytes payload decoding failed: {e}"))),
        }
    }
}

/// Publishes fixed raw bytes decoded once at construction.
#[derive(Debug, Clone)]
pub struct BytesPayloadBuilder {
    payload: Vec<u8>,
}

impl BytesPayloadBuilder {
    pub fn new(value: &str, encoding: &str) -> Result<Self> {
        let encoding: BytesEncoding = encoding.parse()?;
        Ok(Self {
            payload: encoding.decode(value)?,
        })
    }
}

impl PayloadBuilder for BytesPayloadBuilder {
    fn build(&mut self) -> Result<BuiltPayload> {
        Ok(BuiltPayload {
            bytes: self.payload.clone(),
            preview: preview_payload(PreviewSource::Bytes(&self.payload)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_payload() {
        let mut builder = TextPayloadBuilder::new("hello".to_string());
        let built = builder.build().unwrap();
        assert_eq!(built.bytes, b"hello");
        assert_eq!(built.preview, "hello");
    }

    #[test]
    fn test_bytes_encodings() {
        let utf8 = BytesPayloadBuilder::new("ab", "utf8").unwrap().build().unwrap();
        assert_eq!(utf8.bytes, b"ab");

        let hex = BytesPayloadBuilder::new("de ad be ef", "hex").unwrap().build().unwrap();
        assert_eq!(hex.bytes, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(hex.preview, "<bytes 4B>");

        let b64 = BytesPayloadBuilder::new("aGk=", "base64").unwrap().build().unwrap();
        assert_eq!(b64.bytes, b"hi");
    }

    #[test]
    fn test_bytes_errors_are_payload_errors() {
        for (value, encoding) in [("zz", "hex"), ("abc", "hex"), ("!!!", "base64"), ("x", "latin1")] {
            let err = BytesPayloadBuilder::new(value, encoding).unwrap_err();
            assert!(matches!(err, SimError::PayloadBuild(_)), "{value}/{encoding}");
        }
    }
}
