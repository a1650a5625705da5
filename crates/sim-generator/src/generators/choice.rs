//! Uniform pick from a list.

use super::ValueGenerator;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::Value;
use sim_core::{Result, SimError};

#[derive(Debug, Clone)]
pub struct ChoiceGenerator {
    values: Vec<Value>,
    rng: StdRng,
}

impl ChoiceGenerator {
    pub fn new(values: Vec<Value>, rng: StdRng) -> Result<Self> {
        if values.is_empty() {
            return Err(SimError::payload(
                "choice generator requires a non-empty values list",
            ));
        }
        Ok(Self { values, rng })
    }
}

impl ValueGenerator for ChoiceGenerator {
    fn next_value(&mut self) -> Result<Value> {
        let idx = self.rng.gen_range(0..self.values.len());
        Ok(self.values[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn test_choice_picks_members() {
        let values = vec![json!("a"), json!(2), json!(null)];
        let mut generator = ChoiceGenerator::new(values.clone(), StdRng::seed_from_u64(3)).unwrap();
        for _ in 0..50 {
            assert!(values.contains(&generator.next_value().unwrap()));
        }
    }

    #[test]
    fn test_choice_is_deterministic_per_seed() {
        let values = vec![json!(1), json!(2), json!(3), json!(4)];
        let mut a = ChoiceGenerator::new(values.clone(), StdRng::seed_from_u64(11)).unwrap();
        let mut b = ChoiceGenerator::new(values, StdRng::seed_from_u64(11)).unwrap();
        for _ in 0..20 {
            assert_eq!(a.next_value().unwrap(), b.next_value().unwrap());
        }
    }
}
