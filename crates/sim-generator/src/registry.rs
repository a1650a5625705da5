//! Payload builder factory.

use crate::payloads::{
    BytesPayloadBuilder, FilePayloadBuilder, JsonFieldsPayloadBuilder, PayloadBuilder,
    SequencePayloadBuilder, TextPayloadBuilder,
};
use crate::seed::stream_rng;
use sim_core::{PayloadSpec, ResolvedStreamConfig, Result, SimError};
use std::path::Path;
use tracing::debug;

/// Build the payload builder for one resolved stream.
///
/// Relative file paths resolve against `config_dir`. With `seed` set, every
/// random choice the builder makes is reproducible for this stream id.
pub fn build_payload_builder(
    stream: &ResolvedStreamConfig,
    config_dir: &Path,
    seed: Option<u64>,
) -> Result<Box<dyn PayloadBuilder>> {
    let mut rng = stream_rng(seed, &stream.stream_id);
    debug!(
        "Building {} payload builder for stream {}",
        stream.payload.kind(),
        stream.stream_id
    );

    let builder: Box<dyn PayloadBuilder> = match &stream.payload {
        PayloadSpec::Text { value } => Box::new(TextPayloadBuilder::new(value.clone())),
        PayloadSpec::Bytes { value, encoding } => Box::new(BytesPayloadBuilder::new(value, encoding)?),
        PayloadSpec::File { path } => Box::new(FilePayloadBuilder::load(path, config_dir, false)?),
        PayloadSpec::PickleFile { path } => Box::new(FilePayloadBuilder::load(path, config_dir, true)?),
        PayloadSpec::Sequence {
            items,
            encoding,
            repeat,
        } => Box::new(SequencePayloadBuilder::new(items.clone(), encoding, *repeat)?),
        PayloadSpec::JsonFields { fields } => Box::new(JsonFieldsPayloadBuilder::new(fields, &mut rng)?),
    };
    Ok(builder)
}

/// Build every stream's payload builder, stopping at the first failure.
///
/// The error message names the offending stream.
pub fn build_payload_builders(
    streams: &[ResolvedStreamConfig],
    config_dir: &Path,
    seed: Option<u64>,
) -> Result<Vec<Box<dyn PayloadBuilder>>> {
    streams
        .iter()
        .map(|stream| {
            build_payload_builder(stream, config_dir, seed).map_err(|e| match e {
                SimError::PayloadBuild(msg) => {
                    SimError::PayloadBuild(format!("stream {}: {msg}", stream.stream_id))
                }
                other => other,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{parse_config, resolve_streams, ConfigFormat};

    const CONFIG: &str = r#"
brokers: [{ name: main, host: localhost }]
streams:
  - name: sensor
    broker: main
    topic: "sensor/{id}"
    interval: 1
    expand: { kind: range, var: id, start: 1, stop: 2 }
    payload:
      kind: json_fields
      fields:
        - name: id
          generator: { kind: const, value: "{id}" }
        - name: temp
          generator: { kind: number_random, min: 0, max: 100, precision: 2 }
        - name: state
          generator: { kind: choice, values: [idle, busy, error] }
        - name: uid
          generator: { kind: uuid }
        - name: noise
          generator: { kind: expression, expression: "uniform(0, 1) + random" }
"#;

    fn outputs(seed: Option<u64>, n: usize) -> Vec<Vec<Vec<u8>>> {
        let config = parse_config(CONFIG, ConfigFormat::Yaml).unwrap();
        let streams = resolve_streams(&config).unwrap();
        let mut builders = build_payload_builders(&streams, Path::new("."), seed).unwrap();
        builders
            .iter_mut()
            .map(|b| (0..n).map(|_| b.build().unwrap().bytes).collect())
            .collect()
    }

    #[test]
    fn test_seeded_builds_are_reproducible() {
        assert_eq!(outputs(Some(42), 10), outputs(Some(42), 10));
    }

    #[test]
    fn test_different_seeds_diverge() {
        assert_ne!(outputs(Some(1), 5), outputs(Some(2), 5));
    }

    #[test]
    fn test_expanded_streams_get_distinct_sources() {
        let out = outputs(Some(7), 5);
        assert_ne!(out[0], out[1]);
    }

    #[test]
    fn test_failure_names_stream() {
        let yaml = r#"
brokers: [{ name: main, host: localhost }]
streams:
  - name: broken
    broker: main
    topic: t
    interval: 1
    payload: { kind: bytes, value: "xyz", encoding: hex }
"#;
        let config = parse_config(yaml, ConfigFormat::Yaml).unwrap();
        let streams = resolve_streams(&config).unwrap();
        let err = build_payload_builders(&streams, Path::new("."), None).err().unwrap();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().starts_with("stream broken:"));
    }
}
