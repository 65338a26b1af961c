//! Content hashing helpers.

use parity_scale_codec::Encode;
use sha2::{Digest, Sha256};

use crate::codec;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Hashes raw bytes.
pub fn sha256(bytes: &[u8]) -> Hash {
    Sha256::digest(bytes).into()
}

/// Hashes the canonical encoding of a structure.
///
/// This is the only way consensus-critical structures are turned into
/// digests; hashing anything other than the canonical encoding would let two
/// nodes disagree about the hash of identical data.
pub fn hash_of<T: Encode>(v: &T) -> Hash {
    sha256(&codec::to_bytes_canonical(v))
}

/// Renders a digest as lowercase hex for logs and error messages.
pub fn hex_str(h: &Hash) -> String {
    hex::encode(h)
}
