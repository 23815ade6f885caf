//! keys for deposed objects
//!
//! During a create-before-destroy replacement the old object of a resource instance is kept
//! around as "deposed" until the new one exists. Each deposed object gets a short random key.
use rand::RngCore;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeposedKey(String);

impl DeposedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeposedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("must be eight hexadecimal digits")]
pub struct DeposedKeyError;

pub fn new_deposed_key(rng: &mut impl RngCore) -> DeposedKey {
    DeposedKey(format!("{:08x}", rng.next_u32()))
}

/// Generates keys until one is not `taken`
pub fn new_deposed_key_avoiding(
    rng: &mut impl RngCore,
    mut taken: impl FnMut(&DeposedKey) -> bool,
) -> DeposedKey {
    loop {
        let key = new_deposed_key(rng);
        if !taken(&key) {
            return key;
        }
        tracing::debug!(%key, "deposed key already in use, generating another");
    }
}

pub fn parse_deposed_key(src: &str) -> Result<DeposedKey, DeposedKeyError> {
    if src.len() != 8 || !src.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DeposedKeyError);
    }
    Ok(DeposedKey(src.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    /// Yields the given numbers in order, then zeroes
    struct Sequence(Vec<u32>);

    impl RngCore for Sequence {
        fn next_u32(&mut self) -> u32 {
            if self.0.is_empty() {
                0
            } else {
                self.0.remove(0)
            }
        }

        fn next_u64(&mut self) -> u64 {
            self.next_u32() as u64
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0)
        }
    }

    #[test]
    fn eight_hex_digits() {
        let mut rng = Sequence(vec![0xbeef]);
        assert_eq!(new_deposed_key(&mut rng).as_str(), "0000beef");

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..16 {
            let key = new_deposed_key(&mut rng);
            assert_eq!(parse_deposed_key(key.as_str()), Ok(key));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = new_deposed_key(&mut StdRng::seed_from_u64(42));
        let b = new_deposed_key(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn avoids_existing_keys() {
        let existing: HashSet<_> = ["00000001", "00000002"]
            .into_iter()
            .map(|k| parse_deposed_key(k).unwrap())
            .collect();
        let mut rng = Sequence(vec![1, 2, 1, 3]);
        let key = new_deposed_key_avoiding(&mut rng, |k| existing.contains(k));
        assert_eq!(key.to_string(), "00000003");
    }

    #[test]
    fn parse_rejects_malformed() {
        for src in ["", "1234567", "123456789", "0000000g"] {
            assert_eq!(parse_deposed_key(src), Err(DeposedKeyError), "{src}");
        }
        assert_eq!(DeposedKeyError.to_string(), "must be eight hexadecimal digits");
    }
}
