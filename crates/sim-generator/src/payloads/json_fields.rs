//! JSON objects assembled from per-field generators.

use super::{BuiltPayload, PayloadBuilder};
use crate::generators::{build_value_generator, ValueGenerator};
use crate::preview::{preview_payload, PreviewSource};
use crate::seed::child_rng;
use rand::rngs::StdRng;
use serde_json::{Map, Value};
use sim_core::{JsonFieldSpec, Result, SimError};

/// A field name bound to its generator.
pub struct JsonField {
    pub name: String,
    pub generator: Box<dyn ValueGenerator>,
}

/// Emits one compact JSON object per build, keys in declaration order.
pub struct JsonFieldsPayloadBuilder {
    fields: Vec<JsonField>,
}

impl JsonFieldsPayloadBuilder {
    /// Build one generator per field. Each field gets its own random source,
    /// seeded by one draw from `rng` in declaration order.
    pub fn new(specs: &[JsonFieldSpec], rng: &mut StdRng) -> Result<Self> {
        if specs.is_empty() {
            return Err(SimError::payload(
                "json_fields payload requires a non-empty 'fields' list",
            ));
        }
        let mut fields = Vec::with_capacity(specs.len());
        for spec in specs {
            let generator = build_value_generator(&spec.generator, child_rng(rng)).map_err(|e| {
                SimError::payload(format!(
                    "json_fields field '{}' ({}): {e}",
                    spec.name,
                    spec.generator.kind()
                ))
            })?;
            fields.push(JsonField {
                name: spec.name.clone(),
                generator,
            });
        }
        Ok(Self { fields })
    }
}

impl PayloadBuilder for JsonFieldsPayloadBuilder {
    fn build(&mut self) -> Result<BuiltPayload> {
        let mut object = Map::with_capacity(self.fields.len());
        for field in &mut self.fields {
            let value = field.generator.next_value()?;
            object.insert(field.name.clone(), value);
        }
        let object = Value::Object(object);
        Ok(BuiltPayload {
            bytes: object.to_string().into_bytes(),
            preview: preview_payload(PreviewSource::Json(&object)),
        })
    }
}
