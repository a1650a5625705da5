//! Configuration model for the simulator.
//!
//! The document has three parts:
//!
//! - `brokers` - named broker connections ([`BrokerConfig`])
//! - `streams` - stream templates ([`StreamTemplate`]) that resolve into one or
//!   more concrete publish streams
//! - `schema_version` - always `1`
//!
//! Payloads and value generators are `kind`-tagged records. Shape errors
//! (unknown kinds, missing keys, wrong types) are caught while deserializing;
//! semantic checks that belong to a kind (empty lists, `min > max`, bad
//! encodings) are left to builder construction in `sim-generator`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Schema version, must be 1
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Broker connections, keyed by unique name
    pub brokers: Vec<BrokerConfig>,

    /// Stream templates
    pub streams: Vec<StreamTemplate>,
}

impl SimulatorConfig {
    /// Look up a broker by name.
    pub fn get_broker(&self, name: &str) -> Option<&BrokerConfig> {
        self.brokers.iter().find(|b| b.name == name)
    }

    /// Get all broker names in declaration order.
    pub fn broker_names(&self) -> Vec<&str> {
        self.brokers.iter().map(|b| b.name.as_str()).collect()
    }
}

/// Connection settings for one broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Unique broker name referenced by streams
    pub name: String,

    /// Broker host name or address
    pub host: String,

    /// Broker port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Keepalive interval in seconds
    #[serde(default = "default_keepalive")]
    pub keepalive: u64,

    /// Client identifier, generated when absent
    #[serde(default)]
    pub client_id: Option<String>,

    /// Optional username
    #[serde(default)]
    pub username: Option<String>,

    /// Optional password, only used together with `username`
    #[serde(default)]
    pub password: Option<String>,
}

impl BrokerConfig {
    /// Create a broker config with default port and keepalive.
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: default_port(),
            keepalive: default_keepalive(),
            client_id: None,
            username: None,
            password: None,
        }
    }
}

/// A stream template that resolves to one or more publish streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamTemplate {
    /// Optional template name, used as the base of resolved stream ids
    #[serde(default)]
    pub name: Option<String>,

    /// Name of the broker this stream publishes to
    pub broker: String,

    /// Topic pattern, may contain `{var}` placeholders
    pub topic: String,

    /// Publish interval in seconds
    pub interval: f64,

    /// MQTT quality of service (0, 1 or 2)
    #[serde(default)]
    pub qos: u8,

    /// Retain flag
    #[serde(default)]
    pub retain: bool,

    /// Payload definition
    pub payload: PayloadSpec,

    /// Optional expansion directive
    #[serde(default)]
    pub expand: Option<ExpansionSpec>,
}

/// Expansion directive turning one template into many streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpansionSpec {
    /// Integer arithmetic sequence
    Range {
        /// Placeholder name substituted as `{var}`
        var: String,
        /// First value
        start: i64,
        /// Bound of the sequence
        stop: i64,
        /// Increment, must not be 0
        #[serde(default = "default_step")]
        step: i64,
        /// Whether `stop` itself is produced when reached
        #[serde(default = "default_true")]
        inclusive: bool,
    },

    /// Explicit list of values
    List {
        /// Placeholder name substituted as `{var}`
        var: String,
        /// Values in output order
        values: Vec<Value>,
    },
}

impl ExpansionSpec {
    /// Name of the substituted placeholder.
    pub fn var(&self) -> &str {
        match self {
            ExpansionSpec::Range { var, .. } | ExpansionSpec::List { var, .. } => var,
        }
    }
}

/// Payload definition for a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadSpec {
    /// Fixed UTF-8 text
    Text { value: String },

    /// Literal bytes decoded from `utf8`, `hex` or `base64`
    Bytes {
        value: String,
        #[serde(default = "default_bytes_encoding")]
        encoding: String,
    },

    /// Raw bytes read once from a file
    File { path: String },

    /// Raw bytes read once from a pickled file
    PickleFile { path: String },

    /// Cycle through a list of items encoded as `text` or `json`
    Sequence {
        #[serde(default)]
        items: Vec<Value>,
        #[serde(default = "default_text_encoding")]
        encoding: String,
        #[serde(rename = "loop", default = "default_true")]
        repeat: bool,
    },

    /// JSON object assembled from named field generators
    JsonFields {
        #[serde(default)]
        fields: Vec<JsonFieldSpec>,
    },
}

impl PayloadSpec {
    /// The configured payload kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            PayloadSpec::Text { .. } => "text",
            PayloadSpec::Bytes { .. } => "bytes",
            PayloadSpec::File { .. } => "file",
            PayloadSpec::PickleFile { .. } => "pickle_file",
            PayloadSpec::Sequence { .. } => "sequence",
            PayloadSpec::JsonFields { .. } => "json_fields",
        }
    }
}

/// One field of a `json_fields` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonFieldSpec {
    /// JSON key
    pub name: String,

    /// Generator producing the value
    pub generator: GeneratorSpec,
}

/// Value generator configuration.
///
/// Defaults mirror the documented configuration format; anything that needs
/// cross-field validation is checked when the generator is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorSpec {
    /// Always the same literal
    Const {
        #[serde(default)]
        value: Value,
    },

    /// Alternating boolean
    BoolToggle {
        #[serde(default)]
        start: bool,
    },

    /// Bounded back-and-forth walk
    NumberWalk {
        #[serde(default)]
        min: f64,
        #[serde(default = "default_max")]
        max: f64,
        #[serde(default = "default_walk_step")]
        step: f64,
        #[serde(default)]
        start: Option<f64>,
        #[serde(default = "default_numeric_type")]
        numeric_type: String,
    },

    /// Uniform random number in a range
    NumberRandom {
        #[serde(default)]
        min: f64,
        #[serde(default = "default_max")]
        max: f64,
        #[serde(default = "default_numeric_type")]
        numeric_type: String,
        #[serde(default)]
        precision: Option<u32>,
    },

    /// Uniform pick from a list
    Choice {
        #[serde(default)]
        values: Vec<Value>,
    },

    /// Ordered walk through a list
    Sequence {
        #[serde(default)]
        values: Vec<Value>,
        #[serde(rename = "loop", default = "default_true")]
        repeat: bool,
    },

    /// Restricted arithmetic expression
    Expression {
        #[serde(default)]
        expression: String,
    },

    /// Current wall time
    Timestamp {
        #[serde(default = "default_timestamp_mode")]
        mode: String,
    },

    /// Random v4 UUID
    Uuid {},
}

impl GeneratorSpec {
    /// The configured generator kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorSpec::Const { .. } => "const",
            GeneratorSpec::BoolToggle { .. } => "bool_toggle",
            GeneratorSpec::NumberWalk { .. } => "number_walk",
            GeneratorSpec::NumberRandom { .. } => "number_random",
            GeneratorSpec::Choice { .. } => "choice",
            GeneratorSpec::Sequence { .. } => "sequence",
            GeneratorSpec::Expression { .. } => "expression",
            GeneratorSpec::Timestamp { .. } => "timestamp",
            GeneratorSpec::Uuid {} => "uuid",
        }
    }
}

/// Compact summary printed by the `validate` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSummary {
    pub broker_count: usize,
    pub stream_template_count: usize,
    pub resolved_stream_count: usize,
    pub payload_kinds: Vec<String>,
}

impl std::fmt::Display for ConfigSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let payloads = if self.payload_kinds.is_empty() {
            "-".to_string()
        } else {
            self.payload_kinds.join(", ")
        };
        write!(
            f,
            "Config valid: brokers={} stream_templates={} resolved_streams={} payload_kinds=[{}]",
            self.broker_count, self.stream_template_count, self.resolved_stream_count, payloads
        )
    }
}

fn default_schema_version() -> u32 {
    1
}

fn default_port() -> u16 {
    1883
}

fn default_keepalive() -> u64 {
    60
}

fn default_step() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

fn default_bytes_encoding() -> String {
    "utf8".to_string()
}

fn default_text_encoding() -> String {
    "text".to_string()
}

fn default_max() -> f64 {
    100.0
}

fn default_walk_step() -> f64 {
    1.0
}

fn default_numeric_type() -> String {
    "float".to_string()
}

fn default_timestamp_mode() -> String {
    "iso".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_defaults() {
        let spec: PayloadSpec = serde_yaml::from_str("kind: bytes\nvalue: abc\n").unwrap();
        assert_eq!(
            spec,
            PayloadSpec::Bytes {
                value: "abc".to_string(),
                encoding: "utf8".to_string(),
            }
        );

        let spec: PayloadSpec = serde_yaml::from_str("kind: sequence\nitems: [1, 2]\n").unwrap();
        if let PayloadSpec::Sequence {
            encoding, repeat, ..
        } = spec
        {
            assert_eq!(encoding, "text");
            assert!(repeat);
        } else {
            panic!("Expected Sequence payload");
        }
    }

    #[test]
    fn test_generator_kinds_parse() {
        let yaml = r#"
- kind: const
  value: 21
- kind: bool_toggle
  start: true
- kind: number_walk
  min: 0
  max: 10
  step: 3
- kind: number_random
  numeric_type: int
  min: 1
  max: 3
- kind: choice
  values: [a, b]
- kind: sequence
  values: [1, 2, 3]
  loop: false
- kind: expression
  expression: "(prev or 0) + 1"
- kind: timestamp
  mode: unix
- kind: uuid
"#;
        let specs: Vec<GeneratorSpec> = serde_yaml::from_str(yaml).unwrap();
        let kinds: Vec<&str> = specs.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "const",
                "bool_toggle",
                "number_walk",
                "number_random",
                "choice",
                "sequence",
                "expression",
                "timestamp",
                "uuid"
            ]
        );
        assert_eq!(
            specs[5],
            GeneratorSpec::Sequence {
                values: vec![Value::from(1), Value::from(2), Value::from(3)],
                repeat: false,
            }
        );
    }

    #[test]
    fn test_unknown_generator_kind_is_rejected() {
        let result: Result<GeneratorSpec, _> = serde_yaml::from_str("kind: gaussian\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_stream_rejects_unknown_keys() {
        let yaml = r#"
broker: main
topic: a/b
interval: 1
payload: { kind: text, value: x }
colour: blue
"#;
        let result: Result<StreamTemplate, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_summary_display() {
        let summary = ConfigSummary {
            broker_count: 1,
            stream_template_count: 2,
            resolved_stream_count: 4,
            payload_kinds: vec!["json_fields".to_string(), "text".to_string()],
        };
        assert_eq!(
            summary.to_string(),
            "Config valid: brokers=1 stream_templates=2 resolved_streams=4 payload_kinds=[json_fields, text]"
        );
    }
}
