//! Output Writer - Single Replace-In-Place Write

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::beautify::{beautify, BeautifyOptions};

#[derive(Debug, Error)]
#[error("Failed to write {path}: {source}")]
pub struct OutputError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, Clone, Default)]
pub struct OutputWriter {
    beautify: Option<BeautifyOptions>,
}

impl OutputWriter {
    pub fn new(beautify: Option<BeautifyOptions>) -> Self {
        Self { beautify }
    }

    /// Final file contents for `text`, after the optional beautify pass.
    pub fn prepare(&self, text: &str) -> String {
        match &self.beautify {
            Some(options) => beautify(text, options),
            None => text.to_string(),
        }
    }

    /// Writes to a sibling temp file and renames it over `path`, so readers
    /// see either the old file or the complete new one. The parent directory
    /// must already exist.
    pub fn write(&self, text: &str, path: &Path) -> Result<(), OutputError> {
        let contents = self.prepare(text);
        let fail = |source: io::Error| OutputError { path: path.to_path_buf(), source };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(fail)?;
        tmp.write_all(contents.as_bytes()).map_err(fail)?;
        tmp.as_file().sync_all().map_err(fail)?;
        tmp.persist(path).map_err(|e| fail(e.error))?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "constants written");
        Ok(())
    }
}
