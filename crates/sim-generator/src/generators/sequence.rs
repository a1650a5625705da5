//! Ordered walk through a list.

use super::ValueGenerator;
use serde_json::Value;
use sim_core::{Result, SimError};

/// Position in a fixed-length list.
///
/// At the end of the list the cursor restarts at 0 when looping, otherwise it
/// keeps returning the last position.
#[derive(Debug, Clone, Copy)]
pub struct SequenceCursor {
    len: usize,
    index: usize,
    repeat: bool,
}

impl SequenceCursor {
    /// `len` must be non-zero.
    pub fn new(len: usize, repeat: bool) -> Self {
        Self {
            len,
            index: 0,
            repeat,
        }
    }

    /// Index of the next element.
    pub fn next_index(&mut self) -> usize {
        if self.index >= self.len {
            if !self.repeat {
                return self.len.saturating_sub(1);
            }
            self.index = 0;
        }
        let index = self.index;
        self.index += 1;
        index
    }
}

#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    values: Vec<Value>,
    cursor: SequenceCursor,
}

impl SequenceGenerator {
    pub fn new(values: Vec<Value>, repeat: bool) -> Result<Self> {
        if values.is_empty() {
            return Err(SimError::payload(
                "sequence generator requires a non-empty values list",
            ));
        }
        let cursor = SequenceCursor::new(values.len(), repeat);
        Ok(Self { values, cursor })
    }
}

impl ValueGenerator for SequenceGenerator {
    fn next_value(&mut self) -> Result<Value> {
        Ok(self.values[self.cursor.next_index()].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn take(generator: &mut SequenceGenerator, n: usize) -> Vec<Value> {
        (0..n).map(|_| generator.next_value().unwrap()).collect()
    }

    #[test]
    fn test_sequence_loops() {
        let mut generator = SequenceGenerator::new(vec![json!("a"), json!("b")], true).unwrap();
        assert_eq!(
            take(&mut generator, 5),
            vec![json!("a"), json!("b"), json!("a"), json!("b"), json!("a")]
        );
    }

    #[test]
    fn test_sequence_holds_last_without_loop() {
        let mut generator = SequenceGenerator::new(vec![json!(1), json!(2)], false).unwrap();
        assert_eq!(take(&mut generator, 4), vec![json!(1), json!(2), json!(2), json!(2)]);
    }

    #[test]
    fn test_sequence_requires_values() {
        assert!(SequenceGenerator::new(vec![], true).is_err());
    }
}
