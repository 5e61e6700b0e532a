//! Path utilities for the CLI

use log::warn;
use std::path::{Path, PathBuf};

/// `dir` if it is an existing directory, otherwise the current directory (with a warning).
pub fn resolve_output_dir(dir: &Path) -> PathBuf {
    if dir.is_dir() {
        return dir.to_path_buf();
    }
    warn!(
        "Output directory {} does not exist; writing to the current directory",
        dir.display()
    );
    PathBuf::from(".")
}

/// `path` relative to `base` for display; unchanged if it is not under `base`.
pub fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_output_dir_falls_back_to_cwd() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_output_dir(dir.path()), dir.path());
        assert_eq!(
            resolve_output_dir(&dir.path().join("missing")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn relative_display() {
        let base = Path::new("/out");
        assert_eq!(display_relative(Path::new("/out/ATests.cs"), base), "ATests.cs");
        assert_eq!(display_relative(Path::new("/x/B.cs"), base), "/x/B.cs");
    }
}
