use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use rand::Rng;

pub const KEY_SIZE: usize = 24;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

// Process-wide disambiguator: randomly seeded, strictly monotonic.
static NEXT_UNIQUE: Lazy<AtomicU64> =
    Lazy::new(|| AtomicU64::new(rand::thread_rng().gen::<u64>()));

/// Composite 24-byte key ordering the buffer lexicographically by
/// (partition hash, sort timestamp, disambiguator). All three components are
/// stored big-endian so byte order equals logical order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Builds a key for a partition value and a unix-nano sort timestamp.
    pub fn new(partition: &str, sort_by: i64) -> Key {
        let unique = NEXT_UNIQUE.fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; KEY_SIZE];
        bytes[0..8].copy_from_slice(&fnv64a(partition.as_bytes()).to_be_bytes());
        bytes[8..16].copy_from_slice(&(sort_by as u64).to_be_bytes());
        bytes[16..24].copy_from_slice(&unique.to_be_bytes());
        Key(bytes)
    }

    /// The smallest possible key.
    pub fn first() -> Key {
        Key([0u8; KEY_SIZE])
    }

    /// The largest possible key.
    pub fn last() -> Key {
        Key([0xff; KEY_SIZE])
    }

    /// The partition hash of a raw key: its first 8 bytes, big-endian.
    pub fn hash_of(key: &[u8]) -> u64 {
        let mut prefix = [0u8; 8];
        let n = key.len().min(8);
        prefix[..n].copy_from_slice(&key[..n]);
        u64::from_be_bytes(prefix)
    }

    /// The sort timestamp encoded in the middle 8 bytes, as unix nanos.
    pub fn sort_of(&self) -> i64 {
        let mut middle = [0u8; 8];
        middle.copy_from_slice(&self.0[8..16]);
        u64::from_be_bytes(middle) as i64
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Key> {
        if bytes.len() != KEY_SIZE {
            return None;
        }
        let mut out = [0u8; KEY_SIZE];
        out.copy_from_slice(bytes);
        Some(Key(out))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Key({:016x}/{:016x}/{:016x})",
            Key::hash_of(&self.0),
            u64::from_be_bytes(self.0[8..16].try_into().unwrap()),
            u64::from_be_bytes(self.0[16..24].try_into().unwrap()),
        )
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The longest common byte prefix of two keys, usable as an iteration hint.
pub fn prefix_of<'a>(seek: &'a [u8], until: &[u8]) -> &'a [u8] {
    let mut n = 0;
    while n < seek.len() && n < until.len() && seek[n] == until[n] {
        n += 1;
    }
    &seek[..n]
}

/// FNV-64a over the partition value. The hash is a persisted format detail:
/// changing it re-partitions every buffered key.
fn fnv64a(data: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
