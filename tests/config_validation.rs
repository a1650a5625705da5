use mqtt_sim::{format_summary, prepare_simulation, validate_config_file};
use sim_core::SimError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const SENSORS: &str = r#"
brokers:
  - name: local
    host: localhost
streams:
  - name: temp
    broker: local
    topic: "site/{room}/temperature"
    interval: 0.5
    expand: { kind: list, var: room, values: [kitchen, office] }
    payload:
      kind: json_fields
      fields:
        - { name: celsius, generator: { kind: number_walk, min: 18, max: 24, step: 0.5 } }
        - { name: id, generator: { kind: uuid } }
  - broker: local
    topic: status
    interval: 5
    retain: true
    payload: { kind: text, value: online }
"#;

#[test]
fn test_validate_yaml_summary() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "sensors.yaml", SENSORS);

    let summary = validate_config_file(&path).unwrap();
    assert_eq!(
        format_summary(&summary),
        "Config valid: brokers=1 stream_templates=2 resolved_streams=3 payload_kinds=[json_fields, text]"
    );
}

#[test]
fn test_validate_json_by_extension() {
    let dir = TempDir::new().unwrap();
    let doc = serde_json::json!({
        "brokers": [{"name": "b", "host": "127.0.0.1", "port": 1884}],
        "streams": [{
            "broker": "b",
            "topic": "counter/{n}",
            "interval": 1,
            "expand": {"kind": "range", "var": "n", "start": 1, "stop": 4},
            "payload": {"kind": "sequence", "items": [1, 2, 3], "encoding": "json"}
        }]
    });
    let path = write(&dir, "sim.json", &doc.to_string());

    let summary = validate_config_file(&path).unwrap();
    assert_eq!(summary.resolved_stream_count, 4);
    assert_eq!(summary.payload_kinds, vec!["sequence".to_string()]);
}

#[test]
fn test_missing_file_is_load_error() {
    let dir = TempDir::new().unwrap();
    let err = validate_config_file(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, SimError::ConfigLoad(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_malformed_yaml_is_load_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "broken.yaml", "brokers: [\n  - name: x\n");
    let err = validate_config_file(&path).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_validation_collects_every_violation() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "bad.yaml",
        r#"
brokers:
  - { name: local, host: localhost, port: 0 }
streams:
  - broker: nowhere
    topic: ""
    interval: -1
    payload: { kind: text, value: x }
"#,
    );

    let err = validate_config_file(&path).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    let SimError::ConfigValidation { errors, .. } = err else {
        panic!("Expected ConfigValidation");
    };
    assert!(errors.len() >= 4, "{errors:?}");
}

#[test]
fn test_unknown_payload_kind_is_validation_error() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "kind.yaml",
        r#"
brokers: [{ name: local, host: localhost }]
streams:
  - { broker: local, topic: t, interval: 1, payload: { kind: video, value: x } }
"#,
    );
    assert_eq!(validate_config_file(&path).unwrap_err().exit_code(), 2);
}

#[test]
fn test_bad_generator_fails_preparation() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "gen.yaml",
        r#"
brokers: [{ name: local, host: localhost }]
streams:
  - broker: local
    topic: t
    interval: 1
    payload:
      kind: json_fields
      fields:
        - { name: v, generator: { kind: number_random, min: 10, max: 1 } }
"#,
    );

    // structurally valid
    assert!(validate_config_file(&path).is_ok());
    let err = prepare_simulation(&path, Some(1)).unwrap_err();
    assert!(matches!(err, SimError::PayloadBuild(_)));
    assert_eq!(err.exit_code(), 4);
    assert!(err.to_string().starts_with("stream stream-0: "));
}

#[test]
fn test_file_payload_resolves_against_config_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("frame.bin"), [0u8, 1, 2, 3]).unwrap();
    let path = write(
        &dir,
        "file.yaml",
        r#"
brokers: [{ name: local, host: localhost }]
streams:
  - { name: frames, broker: local, topic: cam, interval: 1, payload: { kind: file, path: frame.bin } }
"#,
    );

    let prepared = prepare_simulation(&path, None).unwrap();
    assert_eq!(prepared.streams.len(), 1);
    assert_eq!(prepared.streams[0].stream_id, "frames");
    assert_eq!(prepared.streams[0].payload_kind, "file");
}

#[test]
fn test_prepared_summary_matches_prepared_streams() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "sensors.yaml", SENSORS);

    let prepared = prepare_simulation(&path, Some(7)).unwrap();
    assert_eq!(prepared.summary.resolved_stream_count, prepared.streams.len());
    assert_eq!(prepared.summary, validate_config_file(&path).unwrap());
}
