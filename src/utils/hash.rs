//! Content hashing using blake3.

use std::io::{self, Read};

use serde::{Serialize, Serializer};

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 16 hex chars are enough to tell pages apart
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Stream a reader through blake3, returning the hash and byte count.
pub fn hash_reader(mut reader: impl Read) -> io::Result<(ContentHash, u64)> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];
    let mut len = 0u64;

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
                len += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok((ContentHash::new(*hasher.finalize().as_bytes()), len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_hash_reader_matches_oneshot() {
        let (hash, len) = hash_reader(Cursor::new(b"hello world")).unwrap();
        assert_eq!(len, 11);
        assert_eq!(hash.as_bytes(), blake3::hash(b"hello world").as_bytes());
    }

    #[test]
    fn test_hex_and_short_display() {
        let (hash, _) = hash_reader(Cursor::new(b"x")).unwrap();
        let hex = hash.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(hash.to_string(), hex[..16]);
    }}
