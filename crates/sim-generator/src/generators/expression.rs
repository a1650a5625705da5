//! Generator backed by a compiled expression.

use super::ValueGenerator;
use crate::expression::{EvalContext, Expression, Scalar};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::Value;
use sim_core::{Result, SimError};

/// Evaluates an expression once per call, feeding back the previous result.
#[derive(Debug, Clone)]
pub struct ExpressionGenerator {
    expression: Expression,
    rng: StdRng,
    prev: Scalar,
    count: i64,
}

impl ExpressionGenerator {
    pub fn new(source: &str, rng: StdRng) -> Result<Self> {
        if source.trim().is_empty() {
            return Err(SimError::payload(
                "expression generator requires a non-empty expression",
            ));
        }
        let expression = Expression::compile(source).map_err(|e| SimError::payload(e.to_string()))?;
        Ok(Self {
            expression,
            rng,
            prev: Scalar::None,
            count: 0,
        })
    }
}

impl ValueGenerator for ExpressionGenerator {
    fn next_value(&mut self) -> Result<Value> {
        let random = self.rng.gen::<f64>();
        let time = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        let mut ctx = EvalContext {
            prev: self.prev,
            count: self.count,
            random,
            time,
            rng: &mut self.rng,
        };
        let value = self
            .expression
            .evaluate(&mut ctx)
            .map_err(|e| SimError::payload(e.to_string()))?;
        let json = value.to_json().map_err(|msg| {
            SimError::payload(format!(
                "expression '{}' failed: {msg}",
                self.expression.source()
            ))
        })?;

        self.prev = value;
        self.count += 1;
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn test_counter_expression() {
        let mut generator =
            ExpressionGenerator::new("0 if prev == None else prev + 2", StdRng::seed_from_u64(1)).unwrap();
        let values: Vec<Value> = (0..3).map(|_| generator.next_value().unwrap()).collect();
        assert_eq!(values, vec![json!(0), json!(2), json!(4)]);
    }

    #[test]
    fn test_count_increments() {
        let mut generator = ExpressionGenerator::new("count", StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(generator.next_value().unwrap(), json!(0));
        assert_eq!(generator.next_value().unwrap(), json!(1));
    }

    #[test]
    fn test_failed_evaluation_is_payload_error() {
        let mut generator = ExpressionGenerator::new("1 / count", StdRng::seed_from_u64(1)).unwrap();
        let err = generator.next_value().unwrap_err();
        assert!(matches!(err, SimError::PayloadBuild(_)));
        assert!(err.to_string().contains("division by zero"));
        // count is untouched by the failed call
        let err = generator.next_value().unwrap_err();
        assert!(matches!(err, SimError::PayloadBuild(_)));
    }

    #[test]
    fn test_blank_expression_rejected() {
        assert!(ExpressionGenerator::new("  ", StdRng::seed_from_u64(1)).is_err());
    }

    #[test]
    fn test_seeded_randomness_repeats() {
        let make = || ExpressionGenerator::new("randint(0, 1000) + random", StdRng::seed_from_u64(5)).unwrap();
        let (mut a, mut b) = (make(), make());
        for _ in 0..10 {
            assert_eq!(a.next_value().unwrap(), b.next_value().unwrap());
        }
    }
}
