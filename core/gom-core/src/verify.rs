//! Integrity checks for downloaded release artifacts.
//!
//! The release feed publishes a SHA-256 digest and a byte size for every file;
//! both are checked before an archive is extracted.

use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::errors::{GomError, Result};

/// Verifies that a file matches the expected SHA-256 digest.
///
/// The comparison ignores case, so digests published in upper case match.
///
/// # Errors
///
/// Returns [`GomError::Io`] if the file cannot be read and
/// [`GomError::ChecksumMismatch`] if the digests differ.
pub fn verify_checksum(file_path: &Path, expected: &str) -> Result<()> {
    let computed = compute_sha256(file_path)?;
    let expected = expected.trim().to_ascii_lowercase();

    if computed != expected {
        tracing::warn!(
            path = %file_path.display(),
            %expected,
            actual = %computed,
            "checksum mismatch"
        );
        return Err(GomError::checksum_mismatch(expected, computed));
    }

    tracing::debug!(path = %file_path.display(), "checksum verified");
    Ok(())
}

/// Verifies that a file has exactly `expected` bytes.
///
/// # Errors
///
/// Returns [`GomError::Io`] if the metadata cannot be read and
/// [`GomError::SizeMismatch`] if the sizes differ.
pub fn verify_size(file_path: &Path, expected: u64) -> Result<()> {
    let actual = std::fs::metadata(file_path)
        .map_err(|e| GomError::io_error(format!("failed to stat {}", file_path.display()), e))?
        .len();

    if actual != expected {
        return Err(GomError::size_mismatch(expected, actual));
    }
    Ok(())
}

/// Computes the SHA-256 digest of a file as lowercase hex.
///
/// # Errors
///
/// Returns [`GomError::Io`] if the file cannot be opened or read.
pub fn compute_sha256(file_path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(file_path).map_err(|e| {
        GomError::io_error(
            format!("failed to open {} for checksum", file_path.display()),
            e,
        )
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| {
            GomError::io_error(
                format!("failed to read {} for checksum", file_path.display()),
                e,
            )
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    // SHA-256 of "hello world"
    const HELLO_SHA: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn hello_file(temp: &TempDir) -> std::path::PathBuf {
        let path = temp.path().join("hello.txt");
        std::fs::write(&path, b"hello world").unwrap();
        path
    }

    #[test]
    fn computes_known_digest() {
        let temp = TempDir::new().unwrap();
        let path = hello_file(&temp);
        assert_eq!(compute_sha256(&path).unwrap(), HELLO_SHA);
    }

    #[test]
    fn checksum_comparison_ignores_case() {
        let temp = TempDir::new().unwrap();
        let path = hello_file(&temp);
        verify_checksum(&path, &HELLO_SHA.to_uppercase()).unwrap();
    }

    #[test]
    fn checksum_mismatch_reports_both_digests() {
        let temp = TempDir::new().unwrap();
        let path = hello_file(&temp);
        let wrong = "0".repeat(64);
        match verify_checksum(&path, &wrong) {
            Err(GomError::ChecksumMismatch { expected, actual }) => {
                assert_eq!(expected, wrong);
                assert_eq!(actual, HELLO_SHA);
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn size_is_checked_exactly() {
        let temp = TempDir::new().unwrap();
        let path = hello_file(&temp);
        verify_size(&path, 11).unwrap();
        assert!(matches!(
            verify_size(&path, 12),
            Err(GomError::SizeMismatch {
                expected: 12,
                actual: 11
            })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let temp = TempDir::new().unwrap();
        let result = compute_sha256(&temp.path().join("absent"));
        assert!(matches!(result, Err(GomError::Io { .. })));
    }
}
