//! Configuration loading, validation and summaries.
//!
//! Loading happens in two steps so the error kind is meaningful:
//!
//! 1. The text is parsed into a generic document. Syntax problems are
//!    [`SimError::ConfigLoad`].
//! 2. The document is deserialized into [`SimulatorConfig`] and validated.
//!    Shape and range problems are [`SimError::ConfigValidation`].

use crate::config::{ExpansionSpec, JsonFieldSpec, PayloadSpec, SimulatorConfig};
use crate::error::{Result, SimError};
use crate::expand::{range_len, range_too_large, resolve_streams, ResolvedStreamConfig, MAX_RANGE_VALUES};
use crate::ConfigSummary;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick the format from a file extension; anything but `.json` is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Load and validate a simulator configuration from a file.
pub fn load_config(path: &Path) -> Result<SimulatorConfig> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SimError::ConfigLoad(format!("Config file not found: {}", path.display())),
        _ => SimError::ConfigLoad(format!(
            "Unable to read config file: {}: {e}",
            path.display()
        )),
    })?;

    let config = parse_config(&text, ConfigFormat::from_path(path)).map_err(|e| match e {
        SimError::ConfigLoad(msg) => {
            SimError::ConfigLoad(format!("Invalid config file {}: {msg}", path.display()))
        }
        other => other,
    })?;
    debug!(
        "Loaded config from {:?}: {} brokers, {} stream templates",
        path,
        config.brokers.len(),
        config.streams.len()
    );
    Ok(config)
}

/// Parse and validate a configuration document from a string.
pub fn parse_config(text: &str, format: ConfigFormat) -> Result<SimulatorConfig> {
    let config: SimulatorConfig = match format {
        ConfigFormat::Json => {
            let doc: serde_json::Value =
                serde_json::from_str(text).map_err(|e| SimError::ConfigLoad(e.to_string()))?;
            serde_json::from_value(doc).map_err(|e| SimError::validation(vec![e.to_string()]))?
        }
        ConfigFormat::Yaml => {
            let doc: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| SimError::ConfigLoad(e.to_string()))?;
            serde_yaml::from_value(doc).map_err(|e| SimError::validation(vec![e.to_string()]))?
        }
    };
    validate_config(&config)?;
    Ok(config)
}

/// Check every schema rule that serde cannot express.
///
/// All violations are collected; the returned error lists them in document order.
pub fn validate_config(config: &SimulatorConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.schema_version != 1 {
        errors.push("schema_version: must be 1".to_string());
    }
    if config.brokers.is_empty() {
        errors.push("brokers: must contain at least 1 item".to_string());
    }
    if config.streams.is_empty() {
        errors.push("streams: must contain at least 1 item".to_string());
    }

    let mut seen = HashSet::new();
    let mut duplicates = BTreeSet::new();
    for (i, broker) in config.brokers.iter().enumerate() {
        if broker.name.is_empty() {
            errors.push(format!("brokers[{i}].name: must not be empty"));
        }
        if broker.host.is_empty() {
            errors.push(format!("brokers[{i}].host: must not be empty"));
        }
        if broker.port == 0 {
            errors.push(format!("brokers[{i}].port: must be between 1 and 65535"));
        }
        if broker.keepalive == 0 {
            errors.push(format!("brokers[{i}].keepalive: must be >= 1"));
        }
        if !seen.insert(broker.name.as_str()) {
            duplicates.insert(broker.name.as_str());
        }
    }
    if !duplicates.is_empty() {
        let names: Vec<&str> = duplicates.into_iter().collect();
        errors.push(format!("brokers: duplicate broker names: {}", names.join(", ")));
    }

    for (i, stream) in config.streams.iter().enumerate() {
        let at = format!("streams[{i}]");
        if stream.name.as_deref() == Some("") {
            errors.push(format!("{at}.name: must not be empty"));
        }
        if stream.broker.is_empty() {
            errors.push(format!("{at}.broker: must not be empty"));
        } else if !seen.contains(stream.broker.as_str()) {
            errors.push(format!("{at}.broker: unknown broker '{}'", stream.broker));
        }
        if stream.topic.is_empty() {
            errors.push(format!("{at}.topic: must not be empty"));
        }
        if !(stream.interval.is_finite() && stream.interval > 0.0) {
            errors.push(format!("{at}.interval: must be > 0"));
        }
        if stream.qos > 2 {
            errors.push(format!("{at}.qos: must be 0, 1 or 2"));
        }
        if let Some(expand) = &stream.expand {
            validate_expansion(expand, &format!("{at}.expand"), &mut errors);
        }
        if let PayloadSpec::JsonFields { fields } = &stream.payload {
            validate_fields(fields, &format!("{at}.payload"), &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SimError::validation(errors))
    }
}

fn validate_expansion(expand: &ExpansionSpec, at: &str, errors: &mut Vec<String>) {
    if expand.var().is_empty() {
        errors.push(format!("{at}.var: must not be empty"));
    }
    match expand {
        ExpansionSpec::Range { step, .. } if *step == 0 => {
            errors.push(format!("{at}.step: must not be 0"));
        }
        ExpansionSpec::Range {
            start,
            stop,
            step,
            inclusive,
            ..
        } => {
            let count = range_len(*start, *stop, *step, *inclusive);
            if count > MAX_RANGE_VALUES as u128 {
                errors.push(range_too_large(at, count));
            }
        }
        ExpansionSpec::List { values, .. } if values.is_empty() => {
            errors.push(format!("{at}.values: must contain at least 1 item"));
        }
        _ => {}
    }
}

fn validate_fields(fields: &[JsonFieldSpec], at: &str, errors: &mut Vec<String>) {
    for (i, field) in fields.iter().enumerate() {
        if field.name.is_empty() {
            errors.push(format!("{at}.fields[{i}].name: must not be empty"));
        }
    }
}

/// Build the summary printed by `validate`.
pub fn summarize_config(config: &SimulatorConfig) -> Result<ConfigSummary> {
    let resolved = resolve_streams(config)?;
    Ok(summarize_resolved(config, &resolved))
}

/// Summary of `config` given its already resolved streams.
pub fn summarize_resolved(config: &SimulatorConfig, resolved: &[ResolvedStreamConfig]) -> ConfigSummary {
    let payload_kinds: BTreeSet<&str> = config.streams.iter().map(|s| s.payload.kind()).collect();
    ConfigSummary {
        broker_count: config.brokers.len(),
        stream_template_count: config.streams.len(),
        resolved_stream_count: resolved.len(),
        payload_kinds: payload_kinds.into_iter().map(str::to_string).collect(),
    }
}
