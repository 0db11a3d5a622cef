//! Per-job staging directory for uploaded files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::utils::secure_filename;

/// Uploaded files of one job. The directory is removed when dropped.
#[derive(Debug)]
pub struct StagedUpload {
    dir: TempDir,
    files: Vec<PathBuf>,
    names: HashSet<String>,
}

impl StagedUpload {
    /// Create a staging directory, under `parent` when given.
    pub fn new(parent: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-");
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        Ok(Self {
            dir,
            files: Vec::new(),
            names: HashSet::new(),
        })
    }

    /// Store one uploaded file under a sanitised, unique name.
    pub async fn add_file(&mut self, original_name: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
        let name = self.unique_name(&secure_filename(original_name));
        let path = self.dir.path().join(&name);
        tokio::fs::write(&path, contents).await?;
        self.names.insert(name);
        self.files.push(path.clone());
        Ok(path)
    }

    /// Append `_1`, `_2`, ... before the extension until the name is free.
    fn unique_name(&self, name: &str) -> String {
        if !self.names.contains(name) {
            return name.to_string();
        }
        let (stem, ext) = match name.rfind('.') {
            Some(i) if i > 0 => (&name[..i], &name[i..]),
            _ => (name, ""),
        };
        (1..)
            .map(|n| format!("{}_{}{}", stem, n, ext))
            .find(|candidate| !self.names.contains(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_file_sanitises_and_dedupes() {
        let parent = tempfile::tempdir().unwrap();
        let mut upload = StagedUpload::new(Some(parent.path())).unwrap();

        let first = upload.add_file("../scan 1.pdf", b"one").await.unwrap();
        let second = upload.add_file("scan 1.pdf", b"two").await.unwrap();
        let third = upload.add_file("scan_1.pdf", b"three").await.unwrap();

        assert_eq!(first.file_name().unwrap(), "scan_1.pdf");
        assert_eq!(second.file_name().unwrap(), "scan_1_1.pdf");
        assert_eq!(third.file_name().unwrap(), "scan_1_2.pdf");
        assert_eq!(std::fs::read(&second).unwrap(), b"two");
        assert_eq!(upload.len(), 3);
        assert!(upload.path().starts_with(parent.path()));
    }

    #[tokio::test]
    async fn test_directory_removed_on_drop() {
        let mut upload = StagedUpload::new(None).unwrap();
        upload.add_file("a.txt", b"a").await.unwrap();
        let dir = upload.path().to_path_buf();
        assert!(dir.exists());

        drop(upload);
        assert!(!dir.exists());
    }
}
