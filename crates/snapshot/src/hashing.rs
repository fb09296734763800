use stamp_core::{Error, HashAlgorithm, HashCode, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 8192;

/// Streams regular files through the configured content hash
#[derive(Debug, Clone, Copy)]
pub struct FileHasher {
    algorithm: HashAlgorithm,
}

impl FileHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash the bytes of `path`, following symlinks
    pub fn hash_file(&self, path: &Path) -> Result<HashCode> {
        let file = File::open(path).map_err(|e| Error::snapshot_io(path, "open file for hashing", e))?;

        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
        let mut hasher = self.algorithm.hasher();
        let mut buffer = [0u8; BUFFER_SIZE];

        // Stream the file in chunks
        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .map_err(|e| Error::snapshot_io(path, "read file chunk for hashing", e))?;

            if bytes_read == 0 {
                break;
            }

            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finish())
    }
}
