//! Canonical, deterministic binary codec for all consensus-critical state.
//!
//! Thin wrappers around `parity-scale-codec` (SCALE). Centralizing the codec
//! here guarantees every component uses the exact same serialization for
//! hashed or persisted structures, so two nodes can never disagree about the
//! binary representation of the same value.

use parity_scale_codec::{Decode, DecodeAll, Encode};

/// Encodes a value into its canonical byte representation.
///
/// Use this for all data that is written to consensus-critical storage or
/// included in a hash before signing.
pub fn to_bytes_canonical<T: Encode>(v: &T) -> Vec<u8> {
    v.encode()
}

/// Decodes a value from its canonical byte representation.
///
/// Fails fast on trailing bytes or malformed input; persisted-state callers
/// are expected to map the error into a fatal condition rather than ignore
/// it.
pub fn from_bytes_canonical<T: Decode>(b: &[u8]) -> Result<T, String> {
    T::decode_all(&mut &*b).map_err(|e| format!("canonical decode failed: {}", e))
}
