//! Stateful value generators for `json_fields` payloads.
//!
//! Each field owns one generator built from its [`GeneratorSpec`] and its own
//! random source. A generator is advanced once per payload build.

pub mod choice;
pub mod expression;
pub mod numeric;
pub mod sequence;
pub mod static_value;
pub mod timestamp;
pub mod uuid;

use rand::rngs::StdRng;
use serde_json::Value;
use sim_core::{GeneratorSpec, Result};

/// Trait for producing successive field values.
pub trait ValueGenerator: Send {
    /// Produce the next value.
    fn next_value(&mut self) -> Result<Value>;
}

/// Build a generator for the given configuration.
///
/// Semantic problems (bad bounds, empty lists, unknown modes, invalid
/// expressions) are reported as payload build errors.
pub fn build_value_generator(spec: &GeneratorSpec, rng: StdRng) -> Result<Box<dyn ValueGenerator>> {
    let generator: Box<dyn ValueGenerator> = match spec {
        GeneratorSpec::Const { value } => Box::new(static_value::ConstGenerator::new(value.clone())),

        GeneratorSpec::BoolToggle { start } => Box::new(static_value::BoolToggleGenerator::new(*start)),

        GeneratorSpec::NumberWalk {
            min,
            max,
            step,
            start,
            numeric_type,
        } => Box::new(numeric::NumberWalkGenerator::new(
            *min,
            *max,
            *step,
            *start,
            numeric_type.parse()?,
        )?),

        GeneratorSpec::NumberRandom {
            min,
            max,
            numeric_type,
            precision,
        } => Box::new(numeric::NumberRandomGenerator::new(
            *min,
            *max,
            numeric_type.parse()?,
            *precision,
            rng,
        )?),

        GeneratorSpec::Choice { values } => Box::new(choice::ChoiceGenerator::new(values.clone(), rng)?),

        GeneratorSpec::Sequence { values, repeat } => {
            Box::new(sequence::SequenceGenerator::new(values.clone(), *repeat)?)
        }

        GeneratorSpec::Expression { expression } => {
            Box::new(expression::ExpressionGenerator::new(expression, rng)?)
        }

        GeneratorSpec::Timestamp { mode } => Box::new(timestamp::TimestampGenerator::new(mode.parse()?)),

        GeneratorSpec::Uuid {} => Box::new(uuid::UuidGenerator::new(rng)),
    };
    Ok(generator)
}
