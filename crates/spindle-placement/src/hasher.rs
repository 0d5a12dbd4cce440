//! Hash functions mapping bytes onto the `u64` circle.

/// A deterministic hash from bytes to a position on the hash circle.
///
/// Keys and virtual-node labels go through the same function so both live
/// on the same circle. Implementations must not seed randomly: positions have
/// to agree across calls and across process restarts.
pub trait KeyHasher {
    /// Hash `data` to a position on the circle.
    fn hash(&self, data: &[u8]) -> u64;
}

/// Default hasher: BLAKE3 truncated to its first 8 bytes (little-endian).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl KeyHasher for Blake3Hasher {
    fn hash(&self, data: &[u8]) -> u64 {
        let digest = blake3::hash(data);
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

/// Hash `data` with the default [`Blake3Hasher`].
pub fn hash(data: &[u8]) -> u64 {
    Blake3Hasher.hash(data)
}
