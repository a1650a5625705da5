//! Cycling list of payload items.

use super::{BuiltPayload, PayloadBuilder};
use crate::generators::sequence::SequenceCursor;
use crate::preview::{preview_payload, PreviewSource};
use serde_json::Value;
use sim_core::{Result, SimError};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEncoding {
    /// Strings verbatim, other values in their JSON text form
    Text,
    /// Compact JSON
    Json,
}

impl FromStr for SequenceEncoding {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(SequenceEncoding::Text),
            "json" => Ok(SequenceEncoding::Json),
            _ => Err(SimError::payload(
                "sequence payload encoding must be 'text' or 'json'",
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SequencePayloadBuilder {
    items: Vec<Value>,
    encoding: SequenceEncoding,
    cursor: SequenceCursor,
}

impl SequencePayloadBuilder {
    pub fn new(items: Vec<Value>, encoding: &str, repeat: bool) -> Result<Self> {
        if items.is_empty() {
            return Err(SimError::payload(
                "sequence payload requires a non-empty 'items' list",
            ));
        }
        let encoding = encoding.parse()?;
        let cursor = SequenceCursor::new(items.len(), repeat);
        Ok(Self {
            items,
            encoding,
            cursor,
        })
    }
}

impl PayloadBuilder for SequencePayloadBuilder {
    fn build(&mut self) -> Result<BuiltPayload> {
        let item = &self.items[self.cursor.next_index()];
        Ok(match self.encoding {
            SequenceEncoding::Json => {
                let text = item.to_string();
                BuiltPayload {
                    preview: preview_payload(PreviewSource::Json(item)),
                    bytes: text.into_bytes(),
                }
            }
            SequenceEncoding::Text => {
                let text = match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                BuiltPayload {
                    preview: preview_payload(PreviewSource::Text(&text)),
                    bytes: text.into_bytes(),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn texts(builder: &mut SequencePayloadBuilder, n: usize) -> Vec<String> {
        (0..n)
            .map(|_| String::from_utf8(builder.build().unwrap().bytes).unwrap())
            .collect()
    }

    #[test]
    fn test_text_sequence_loops() {
        let mut builder =
            SequencePayloadBuilder::new(vec![json!("on"), json!("off"), json!(3)], "text", true).unwrap();
        assert_eq!(texts(&mut builder, 4), vec!["on", "off", "3", "on"]);
    }

    #[test]
    fn test_json_sequence_holds_last() {
        let items = vec![json!({"a": 1}), json!("s")];
        let mut builder = SequencePayloadBuilder::new(items, "json", false).unwrap();
        assert_eq!(texts(&mut builder, 3), vec![r#"{"a":1}"#, r#""s""#, r#""s""#]);
    }

    #[test]
    fn test_json_string_item_keeps_quotes_on_the_wire_only() {
        let mut builder = SequencePayloadBuilder::new(vec![json!("s")], "json", true).unwrap();
        let built = builder.build().unwrap();
        assert_eq!(built.bytes, br#""s""#.to_vec());
        assert_eq!(built.preview, "s");
    }

    #[test]
    fn test_sequence_validation() {
        assert!(SequencePayloadBuilder::new(vec![], "text", true).is_err());
        assert!(SequencePayloadBuilder::new(vec![json!(1)], "xml", true).is_err());
    }
}
