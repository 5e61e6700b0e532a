//! Collaborator seams: reading inputs, transforming documents, and writing
//! artifacts.
//!
//! The pipeline only depends on these traits. The filesystem implementations are the defaults;
//! tests substitute their own implementations to observe concurrency and inject failures.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::TransformError;
use crate::types::GeneratedFile;

/// Loads the full text of one input.
pub trait SourceReader: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Turns one document into zero or more generated files. Must not assume anything
/// about ordering across documents.
pub trait Transform: Send + Sync {
    fn transform(&self, content: &str) -> Result<Vec<GeneratedFile>, TransformError>;
}

impl<F> Transform for F
where
    F: Fn(&str) -> Result<Vec<GeneratedFile>, TransformError> + Send + Sync,
{
    fn transform(&self, content: &str) -> Result<Vec<GeneratedFile>, TransformError> {
        self(content)
    }
}

/// Persists one artifact, replacing whatever is at `destination`.
pub trait ArtifactWriter: Send + Sync {
    fn write(&self, destination: &Path, content: &str) -> io::Result<()>;
}

/// Reads a file to a string. The handle is closed before returning.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        let mut file = File::open(path)?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        Ok(buf)
    }
}

static TEMP_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Writes to a unique sibling temp file, then renames it over the destination.
/// A reader of `destination` sees either the old content or the complete new content.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsWriter;

impl FsWriter {
    fn temp_path_for(destination: &Path) -> PathBuf {
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        destination
            .parent()
            .unwrap_or(Path::new("."))
            .join(format!(".{name}.{}.{seq}.tmp", std::process::id()))
    }

    fn write_temp(temp: &Path, content: &str) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(temp)?);
        out.write_all(content.as_bytes())?;
        out.flush()?;
        out.get_ref().sync_all()
    }
}

impl ArtifactWriter for FsWriter {
    fn write(&self, destination: &Path, content: &str) -> io::Result<()> {
        let temp = Self::temp_path_for(destination);
        let result = Self::write_temp(&temp, content).and_then(|()| fs::rename(&temp, destination));
        if result.is_err() {
            let _ = fs::remove_file(&temp);
        }
        result
    }
}
