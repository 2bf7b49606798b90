// Scoped local working file.
//
// The spool file must not outlive the staging attempt, whether the upload
// succeeded or not. Removal happens in Drop so every exit path is covered.

use std::path::{Path, PathBuf};

pub(crate) struct SpoolFile {
    path: PathBuf,
}

impl SpoolFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpoolFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove spool file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_the_file_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output_Mar_2008.csv");
        std::fs::write(&path, b"header\n").unwrap();

        {
            let _spool = SpoolFile::new(path.clone());
        }

        assert!(!path.exists());
    }

    #[test]
    fn missing_file_on_drop_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let _spool = SpoolFile::new(dir.path().join("never-created.csv"));
    }
}
