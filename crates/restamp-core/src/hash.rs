use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Files above this are never read for hashing; reading multi-gigabyte
/// videos end to end would dominate the whole run.
pub const MAX_HASH_SIZE: u64 = 64 * 1024 * 1024;

/// Content identity of a file. The oversized case is its own variant so it
/// can never collide with a real digest; two `TooLargeToHash` values say
/// nothing about the underlying bytes and never count as duplicate content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentDigest {
    /// SHA-256 of the full file content, lowercase hex
    Hashed(String),
    TooLargeToHash,
}

impl ContentDigest {
    pub fn hex(&self) -> Option<&str> {
        match self {
            ContentDigest::Hashed(hex) => Some(hex),
            ContentDigest::TooLargeToHash => None,
        }
    }
}

/// Stream a file through SHA-256. Files larger than [`MAX_HASH_SIZE`] are
/// not opened at all.
pub fn digest_file(path: &Path, size: u64) -> io::Result<ContentDigest> {
    if size > MAX_HASH_SIZE {
        return Ok(ContentDigest::TooLargeToHash);
    }

    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(ContentDigest::Hashed(hex::encode(hasher.finalize())))
}
