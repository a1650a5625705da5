//! Random source derivation.
//!
//! ```text
//! base seed ──► derive_stream_seed(base, stream_id) ──► stream StdRng
//!                                                         │
//!                               one u64 per field, in ◄───┘
//!                               declaration order
//!                                         │
//!                                         ▼
//!                                  field StdRng (child_rng)
//! ```
//!
//! The stream seed only depends on the base seed and the stream id, so adding,
//! removing or reordering other streams never changes it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Derive the seed for one stream from the process-wide base seed.
pub fn derive_stream_seed(base_seed: u64, stream_id: &str) -> u64 {
    splitmix64(base_seed ^ fnv1a(stream_id.as_bytes()))
}

/// Random source for a stream: seeded when a base seed is configured,
/// entropy-backed otherwise.
pub fn stream_rng(base_seed: Option<u64>, stream_id: &str) -> StdRng {
    match base_seed {
        Some(seed) => StdRng::seed_from_u64(derive_stream_seed(seed, stream_id)),
        None => StdRng::from_entropy(),
    }
}

/// Draw exactly one value from `parent` and seed a child source with it.
pub fn child_rng(parent: &mut StdRng) -> StdRng {
    StdRng::seed_from_u64(parent.gen::<u64>())
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
