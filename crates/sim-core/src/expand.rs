//! Stream template expansion.
//!
//! A template without an `expand` directive resolves to exactly one stream.
//! With a directive, one stream is produced per expansion value and `{var}`
//! is substituted in the topic and in every string inside the payload spec.

use crate::config::{ExpansionSpec, PayloadSpec, SimulatorConfig, StreamTemplate};
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Largest number of streams a single range expansion may produce.
pub const MAX_RANGE_VALUES: usize = 10_000;

/// The variable substituted into a resolved stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionContext {
    pub var: String,
    pub value: Value,
}

/// A concrete publish stream produced from a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStreamConfig {
    /// Unique id, stable for a given template and expansion value
    pub stream_id: String,
    /// Broker name
    pub broker: String,
    /// Topic with placeholders substituted
    pub topic: String,
    /// Publish interval in seconds
    pub interval: f64,
    pub qos: u8,
    pub retain: bool,
    /// Payload spec with placeholders substituted
    pub payload: PayloadSpec,
    /// Substituted variable, `None` when the template was not expanded
    pub context: Option<ExpansionContext>,
}

/// Resolve every template of a configuration, in template order.
///
/// Fails with a validation error if two resolved streams share an id.
pub fn resolve_streams(config: &SimulatorConfig) -> Result<Vec<ResolvedStreamConfig>> {
    let mut resolved = Vec::new();
    for (position, template) in config.streams.iter().enumerate() {
        resolved.extend(resolve_template(position, template)?);
    }

    let mut seen = HashSet::new();
    let duplicates: Vec<String> = resolved
        .iter()
        .filter(|s| !seen.insert(s.stream_id.as_str()))
        .map(|s| format!("streams: duplicate stream id '{}'", s.stream_id))
        .collect();
    if !duplicates.is_empty() {
        return Err(SimError::validation(duplicates));
    }

    Ok(resolved)
}

/// Resolve one template at the given position into concrete streams.
pub fn resolve_template(
    position: usize,
    template: &StreamTemplate,
) -> Result<Vec<ResolvedStreamConfig>> {
    let base = template
        .name
        .clone()
        .unwrap_or_else(|| format!("stream-{position}"));

    let Some(expand) = &template.expand else {
        return Ok(vec![ResolvedStreamConfig {
            stream_id: base,
            broker: template.broker.clone(),
            topic: template.topic.clone(),
            interval: template.interval,
            qos: template.qos,
            retain: template.retain,
            payload: template.payload.clone(),
            context: None,
        }]);
    };

    let var = expand.var();
    let placeholder = format!("{{{var}}}");
    let payload_doc = serde_json::to_value(&template.payload)
        .map_err(|e| SimError::RuntimeExecution(format!("payload spec serialization failed: {e}")))?;

    expansion_values(expand)?
        .into_iter()
        .map(|value| {
            let text = render_value(&value);
            let payload = substitute_value(&payload_doc, &placeholder, &text);
            let payload: PayloadSpec = serde_json::from_value(payload).map_err(|e| {
                SimError::validation(vec![format!(
                    "streams[{position}].payload: invalid after substituting {placeholder}: {e}"
                )])
            })?;
            Ok(ResolvedStreamConfig {
                stream_id: format!("{base}[{var}={text}]"),
                broker: template.broker.clone(),
                topic: template.topic.replace(&placeholder, &text),
                interval: template.interval,
                qos: template.qos,
                retain: template.retain,
                payload,
                context: Some(ExpansionContext {
                    var: var.to_string(),
                    value,
                }),
            })
        })
        .collect()
}

/// Produce the ordered expansion values of a directive.
pub fn expansion_values(expand: &ExpansionSpec) -> Result<Vec<Value>> {
    match expand {
        ExpansionSpec::Range {
            start,
            stop,
            step,
            inclusive,
            ..
        } => Ok(range_values(*start, *stop, *step, *inclusive)?
            .into_iter()
            .map(Value::from)
            .collect()),
        ExpansionSpec::List { values, .. } => {
            if values.is_empty() {
                return Err(SimError::validation(vec![
                    "expand.values: must contain at least 1 item".to_string(),
                ]));
            }
            Ok(values.clone())
        }
    }
}

/// Arithmetic sequence from `start` towards `stop` by `step`.
///
/// A rising sequence continues while the value is below `stop` (or equal, when
/// inclusive); a falling one mirrors that.
pub fn range_values(start: i64, stop: i64, step: i64, inclusive: bool) -> Result<Vec<i64>> {
    if step == 0 {
        return Err(SimError::validation(vec![
            "expand.step: must not be 0".to_string()
        ]));
    }
    let count = range_len(start, stop, step, inclusive);
    if count > MAX_RANGE_VALUES as u128 {
        return Err(SimError::validation(vec![range_too_large("expand", count)]));
    }

    let within = |v: i64| match (step > 0, inclusive) {
        (true, true) => v <= stop,
        (true, false) => v < stop,
        (false, true) => v >= stop,
        (false, false) => v > stop,
    };

    let mut values = Vec::new();
    let mut current = start;
    while within(current) {
        values.push(current);
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(values)
}

/// Number of values a range produces, without materializing it. 0 when `step` is 0.
pub fn range_len(start: i64, stop: i64, step: i64, inclusive: bool) -> u128 {
    if step == 0 {
        return 0;
    }
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let span = if step > 0 { stop - start } else { start - stop };
    let step = step.abs();
    if span < 0 || (span == 0 && !inclusive) {
        return 0;
    }
    let mut count = span / step + 1;
    if !inclusive && span % step == 0 {
        count -= 1;
    }
    count as u128
}

pub(crate) fn range_too_large(at: &str, count: u128) -> String {
    format!("{at}: range produces {count} values (max {MAX_RANGE_VALUES})")
}

/// Text form of an expansion value: strings verbatim, everything else as JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace `placeholder` in every string reachable inside `value`.
pub fn substitute_value(value: &Value, placeholder: &str, text: &str) -> Value {
    match value {
        Value::String(s) => Value::String(s.replace(placeholder, text)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| substitute_value(v, placeholder, text))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_value(v, placeholder, text)))
                .collect(),
        ),
        other => other.clone(),
    }
}
