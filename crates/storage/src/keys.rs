//! Key layout for the node core's persistent records.

/// The committed block-store height marker, serialized as JSON.
pub const BLOCK_STORE_KEY: &[u8] = b"blockstore";

/// The current chain state, canonical-encoded.
pub const CHAIN_STATE_KEY: &[u8] = b"state:current";

/// The chain-state snapshot written after every successful commit; rollback
/// re-asserts this as current.
pub const CHAIN_STATE_SNAPSHOT_KEY: &[u8] = b"state:snapshot";

const VALIDATOR_SET_PREFIX: &[u8] = b"validators:";

/// Key of the validator-set record effective at `height`.
pub fn validator_set_key(height: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(VALIDATOR_SET_PREFIX.len() + 8);
    key.extend_from_slice(VALIDATOR_SET_PREFIX);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_set_keys_are_distinct_and_ordered() {
        let a = validator_set_key(1);
        let b = validator_set_key(2);
        assert_ne!(a, b);
        // Big-endian heights keep lexicographic and numeric order aligned.
        assert!(a < b);
    }
}
