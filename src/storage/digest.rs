//! Content digests for audit.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::core::error::CoreError;

/// 64-character lowercase hex SHA-256 digest of the file at `path`.
pub fn sha256(path: &Path) -> Result<String, CoreError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn digest_is_64_char_lowercase_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"concentration").unwrap();
        drop(f);

        let digest = sha256(&path).unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn digest_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, b"same bytes").unwrap();
        assert_eq!(sha256(&path).unwrap(), sha256(&path).unwrap());
    }
}
