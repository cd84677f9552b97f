// src/artifact/hash.rs

use std::fs::File;
use std::io::Read;
use std::path::Path;

use blake3::Hasher;
use tracing::trace;

use crate::errors::Result;
use crate::types::Fingerprint;

/// Size of the read buffer used when streaming files through the hasher.
const CHUNK_SIZE: usize = 8192;

/// Compute the content fingerprint of a single file.
///
/// The file is streamed in fixed-size chunks so memory use stays bounded
/// regardless of file size. Fails if the file cannot be opened.
pub fn compute_file_hash(path: &Path) -> Result<Fingerprint> {
    let mut hasher = Hasher::new();
    let mut file = File::open(path)?;
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    let hash = hasher.finalize().to_hex().to_string();
    trace!(?path, hash = %hash, "hashed file");
    Ok(hash)
}

/// Compute the content fingerprint of an in-process value.
pub fn compute_bytes_hash(bytes: &[u8]) -> Fingerprint {
    blake3::hash(bytes).to_hex().to_string()
}
