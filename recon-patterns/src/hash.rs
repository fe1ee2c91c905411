use fnv::FnvHasher;
use std::hash::{Hash, Hasher};

/// Stable hash of `value` reduced mod `modulus`. Built on `fnv`'s fixed-offset FNV-1a, which —
/// unlike `std`'s default `SipHash` — never seeds itself from process entropy, so the same
/// input produces the same feature value across runs and process restarts.
pub fn stable_hash_mod(value: &str, modulus: u64) -> u64 {
    let mut hasher = FnvHasher::default();
    value.hash(&mut hasher);
    hasher.finish() % modulus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_hashes_identically() {
        assert_eq!(stable_hash_mod("JPM", 97), stable_hash_mod("JPM", 97));
    }

    #[test]
    fn different_inputs_usually_hash_differently() {
        assert_ne!(stable_hash_mod("JPM", 997), stable_hash_mod("GOLDMAN SACHS", 997));
    }
}
