//! Numeric value generators.

use super::ValueGenerator;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::{Number, Value};
use sim_core::{Result, SimError};
use std::str::FromStr;

/// Output type of a numeric generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    Int,
    Float,
}

impl FromStr for NumericType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int" => Ok(NumericType::Int),
            "float" => Ok(NumericType::Float),
            other => Err(SimError::payload(format!(
                "numeric_type must be 'int' or 'float', got '{other}'"
            ))),
        }
    }
}

fn float_value(value: f64) -> Result<Value> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| SimError::payload(format!("{value} is not a finite number")))
}

/// Walks back and forth between `min` and `max`.
#[derive(Debug, Clone)]
pub struct NumberWalkGenerator {
    min: f64,
    max: f64,
    step: f64,
    current: f64,
    direction: f64,
    numeric_type: NumericType,
}

impl NumberWalkGenerator {
    pub fn new(
        min: f64,
        max: f64,
        step: f64,
        start: Option<f64>,
        numeric_type: NumericType,
    ) -> Result<Self> {
        if step.is_nan() || step <= 0.0 {
            return Err(SimError::payload("number_walk step must be > 0"));
        }
        if min > max {
            return Err(SimError::payload("number_walk min must be <= max"));
        }
        Ok(Self {
            min,
            max,
            step,
            current: start.unwrap_or(min),
            direction: 1.0,
            numeric_type,
        })
    }
}

impl ValueGenerator for NumberWalkGenerator {
    fn next_value(&mut self) -> Result<Value> {
        let value = self.current;
        let mut next = value + self.step * self.direction;
        if next > self.max || next < self.min {
            self.direction = -self.direction;
            next = (value + self.step * self.direction).clamp(self.min, self.max);
        }
        self.current = next;

        match self.numeric_type {
            NumericType::Int => Ok(Value::from(value.round_ties_even() as i64)),
            NumericType::Float => float_value(value),
        }
    }
}

/// Uniform random numbers in `[min, max]`.
#[derive(Debug, Clone)]
pub struct NumberRandomGenerator {
    min: f64,
    max: f64,
    numeric_type: NumericType,
    precision: Option<u32>,
    rng: StdRng,
}

impl NumberRandomGenerator {
    pub fn new(
        min: f64,
        max: f64,
        numeric_type: NumericType,
        precision: Option<u32>,
        rng: StdRng,
    ) -> Result<Self> {
        if min > max {
            return Err(SimError::payload("number_random min must be <= max"));
        }
        if !(min.is_finite() && max.is_finite()) {
            return Err(SimError::payload("number_random bounds must be finite"));
        }
        Ok(Self {
            min,
            max,
            numeric_type,
            precision,
            rng,
        })
    }
}

impl ValueGenerator for NumberRandomGenerator {
    fn next_value(&mut self) -> Result<Value> {
        match self.numeric_type {
            NumericType::Int => {
                let (low, high) = (self.min.trunc() as i64, self.max.trunc() as i64);
                Ok(Value::from(self.rng.gen_range(low..=high)))
            }
            NumericType::Float => {
                let mut value = self.rng.gen_range(self.min..=self.max);
                if let Some(precision) = self.precision {
                    let factor = 10f64.powi(precision.min(15) as i32);
                    value = (value * factor).round() / factor;
                }
                float_value(value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn test_walk_reverses_at_bounds() {
        let mut generator =
            NumberWalkGenerator::new(0.0, 10.0, 3.0, Some(0.0), NumericType::Int).unwrap();
        let values: Vec<Value> = (0..8).map(|_| generator.next_value().unwrap()).collect();
        assert_eq!(
            values,
            vec![json!(0), json!(3), json!(6), json!(9), json!(6), json!(3), json!(0), json!(3)]
        );
    }

    #[test]
    fn test_walk_never_leaves_bounds() {
        let mut generator =
            NumberWalkGenerator::new(-1.5, 2.0, 0.7, None, NumericType::Float).unwrap();
        for _ in 0..200 {
            let v = generator.next_value().unwrap().as_f64().unwrap();
            assert!((-1.5..=2.0).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn test_walk_step_larger_than_range_clamps() {
        let mut generator = NumberWalkGenerator::new(0.0, 1.0, 5.0, None, NumericType::Float).unwrap();
        for _ in 0..10 {
            let v = generator.next_value().unwrap().as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_walk_validation() {
        assert!(NumberWalkGenerator::new(0.0, 10.0, 0.0, None, NumericType::Int).is_err());
        assert!(NumberWalkGenerator::new(0.0, 10.0, -1.0, None, NumericType::Int).is_err());
        assert!(NumberWalkGenerator::new(10.0, 0.0, 1.0, None, NumericType::Int).is_err());
    }

    #[test]
    fn test_random_int_in_range() {
        let rng = StdRng::seed_from_u64(42);
        let mut generator = NumberRandomGenerator::new(10.0, 20.0, NumericType::Int, None, rng).unwrap();
        for _ in 0..100 {
            let v = generator.next_value().unwrap().as_i64().unwrap();
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_random_float_precision() {
        let rng = StdRng::seed_from_u64(42);
        let mut generator =
            NumberRandomGenerator::new(0.0, 1.0, NumericType::Float, Some(2), rng).unwrap();
        for _ in 0..100 {
            let v = generator.next_value().unwrap().as_f64().unwrap();
            assert!((0.0..=1.0).contains(&v));
            assert!(((v * 100.0).round() - v * 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_numeric_type_parse() {
        assert_eq!("int".parse::<NumericType>().unwrap(), NumericType::Int);
        assert_eq!("float".parse::<NumericType>().unwrap(), NumericType::Float);
        assert!("decimal".parse::<NumericType>().is_err());
    }
}
