//! UUID value generator.

use super::ValueGenerator;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::Value;
use sim_core::Result;
use uuid::Uuid;

/// Random v4 UUIDs drawn from the field's own random source, so seeded runs
/// repeat them.
#[derive(Debug, Clone)]
pub struct UuidGenerator {
    rng: StdRng,
}

impl UuidGenerator {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl ValueGenerator for UuidGenerator {
    fn next_value(&mut self) -> Result<Value> {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes);

        bytes[6] = (bytes[6] & 0x0f) | 0x40; // version 4
        bytes[8] = (bytes[8] & 0x3f) | 0x80; // RFC 4122 variant

        Ok(Value::String(Uuid::from_bytes(bytes).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_uuid_is_v4() {
        let mut generator = UuidGenerator::new(StdRng::seed_from_u64(42));
        let value = generator.next_value().unwrap();
        let parsed = Uuid::parse_str(value.as_str().unwrap()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_ne!(generator.next_value().unwrap(), value);
    }

    #[test]
    fn test_uuid_deterministic() {
        let mut a = UuidGenerator::new(StdRng::seed_from_u64(42));
        let mut b = UuidGenerator::new(StdRng::seed_from_u64(42));
        assert_eq!(a.next_value().unwrap(), b.next_value().unwrap());
    }
}
