//! File-content hashing for the ingest dedup check (§4.6: `h ← md5(file)`).
//! Deliberately MD5, not the SHA-256 used elsewhere in the workspace
//! (bank-statement natural keys, the scanner's own file identity) — this
//! hash only ever gates `processed_files` lookups, never a natural key,
//! so there is no reason to share the stronger hash's code path.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ledger_domain::{LedgerError, LedgerResult};
use md5::{Digest, Md5};

const CHUNK_SIZE: usize = 8192;

pub fn hash_file(path: &Path) -> LedgerResult<String> {
    let mut file = File::open(path)
        .map_err(|e| LedgerError::invalid(format!("cannot open {}: {e}", path.display())))?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| LedgerError::invalid(format!("cannot read {}: {e}", path.display())))?;
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
    fn hash_is_stable_for_identical_content() {
        let mut a = tempfile::NamedTempFile::new().unwrap();
        write!(a, "same content").unwrap();
        let mut b = tempfile::NamedTempFile::new().unwrap();
        write!(b, "same content").unwrap();

        assert_eq!(hash_file(a.path()).unwrap(), hash_file(b.path()).unwrap());
    }

    #[test]
    fn hash_differs_for_different_content() {
        let mut a = tempfile::NamedTempFile::new().unwrap();
        write!(a, "content one").unwrap();
        let mut b = tempfile::NamedTempFile::new().unwrap();
        write!(b, "content two").unwrap();

        assert_ne!(hash_file(a.path()).unwrap(), hash_file(b.path()).unwrap());
    }
}
