//! Content digests for written artifacts

use blake3::Hasher;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::types::WrittenArtifact;
use crate::utils::config::HashingConsts;

/// blake3 of `bytes`, lowercase hex.
pub fn digest_hex(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// blake3 of a file on disk, lowercase hex. Used to verify a written artifact.
pub fn digest_file(path: &Path) -> std::io::Result<String> {
    let mut reader = std::io::BufReader::with_capacity(
        HashingConsts::READ_CHUNK_SIZE,
        File::open(path)?,
    );
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; HashingConsts::READ_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Re-hash every artifact on disk. Returns the destinations whose content no longer
/// matches the digest recorded at write time (or that cannot be read).
pub fn verify_artifacts(artifacts: &[WrittenArtifact]) -> Vec<PathBuf> {
    artifacts
        .iter()
        .filter(|a| match digest_file(&a.destination) {
            Ok(digest) => digest != a.digest,
            Err(e) => {
                log::warn!("{}: {}", a.destination.display(), e);
                true
            }
        })
        .map(|a| a.destination.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_digest_matches_content_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.cs");
        std::fs::write(&path, "namespace A.Test {}").unwrap();
        assert_eq!(
            digest_file(&path).unwrap(),
            digest_hex(b"namespace A.Test {}")
        );
        assert_eq!(digest_hex(b"").len(), 64);
    }

    #[test]
    fn verify_flags_changed_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = |name: &str, body: &str| {
            let destination = dir.path().join(name);
            std::fs::write(&destination, body).unwrap();
            WrittenArtifact {
                item: crate::types::ItemKey::new(0, "a.cs"),
                destination,
                bytes: body.len(),
                digest: digest_hex(body.as_bytes()),
            }
        };
        let kept = artifact("ATests.cs", "a");
        let changed = artifact("BTests.cs", "b");
        let missing = artifact("CTests.cs", "c");
        std::fs::write(&changed.destination, "edited").unwrap();
        std::fs::remove_file(&missing.destination).unwrap();

        let bad = verify_artifacts(&[kept, changed.clone(), missing.clone()]);
        assert_eq!(bad, vec![changed.destination, missing.destination]);
    }
}
