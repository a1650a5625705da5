//! Payload builders that turn a payload spec into publish bytes.
//!
//! Builders are stateful: sequence builders advance a cursor and
//! `json_fields` builders advance one generator per field on every call.

pub mod file;
pub mod json_fields;
pub mod sequence;
pub mod text;

use sim_core::Result;

/// Encoded payload plus its display preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPayload {
    pub bytes: Vec<u8>,
    pub preview: String,
}

/// Produces the next payload for one stream.
pub trait PayloadBuilder: Send {
    /// Build and encode the next payload.
    fn build(&mut self) -> Result<BuiltPayload>;
}

pub use file::FilePayloadBuilder;
pub use json_fields::{JsonField, JsonFieldsPayloadBuilder};
pub use sequence::{SequenceEncoding, SequencePayloadBuilder};
pub use text::{BytesEncoding, BytesPayloadBuilder, TextPayloadBuilder};
