//! Constant and toggling generators.

use super::ValueGenerator;
use serde_json::Value;
use sim_core::Result;

/// Returns the configured literal every time.
#[derive(Debug, Clone)]
pub struct ConstGenerator {
    value: Value,
}

impl ConstGenerator {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl ValueGenerator for ConstGenerator {
    fn next_value(&mut self) -> Result<Value> {
        Ok(self.value.clone())
    }
}

/// Returns the current boolean, then flips it.
#[derive(Debug, Clone)]
pub struct BoolToggleGenerator {
    value: bool,
}

impl BoolToggleGenerator {
    pub fn new(start: bool) -> Self {
        Self { value: start }
    }
}

impl ValueGenerator for BoolToggleGenerator {
    fn next_value(&mut self) -> Result<Value> {
        let current = self.value;
        self.value = !current;
        Ok(Value::Bool(current))
    }
}
