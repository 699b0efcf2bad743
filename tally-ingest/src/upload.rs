//! Upload staging.
//!
//! An uploaded payload is copied into the uploads directory as
//! `<unix-millis>-<random>-<original name>` and handed out as an
//! [`UploadArtifact`]. The artifact owns the file: `release` deletes it and
//! consumes the artifact, and an artifact dropped without `release` deletes
//! its file too, so the file goes away exactly once whatever path the caller
//! takes.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::Utc;
use tempfile::NamedTempFile;

use crate::csv_source::CsvRowSource;
use crate::types::SourceError;

/// 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const FALLBACK_NAME: &str = "upload.csv";

#[derive(Debug)]
pub struct UploadArtifact {
    file: NamedTempFile,
    original_name: String,
    size: u64,
}

impl UploadArtifact {
    /// Copy `reader` into `dir`, refusing payloads over `max_bytes`.
    ///
    /// Nothing is left behind in `dir` when staging fails.
    pub fn stage<R: Read>(
        reader: R,
        original_name: &str,
        dir: impl AsRef<Path>,
        max_bytes: u64,
    ) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let name = sanitize_name(original_name);
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", Utc::now().timestamp_millis()))
            .suffix(&format!("-{name}"))
            .rand_bytes(6)
            .tempfile_in(dir)?;

        // One byte past the limit is enough to know it is too big
        let size = io::copy(&mut reader.take(max_bytes.saturating_add(1)), &mut file)?;
        if size > max_bytes {
            tracing::warn!("Rejected upload {name:?}: larger than {max_bytes} bytes");
            return Err(SourceError::TooLarge { limit: max_bytes });
        }
        file.flush()?;

        tracing::debug!("Staged upload {name:?} ({size} bytes) at {}", file.path().display());

        Ok(Self {
            file,
            original_name: name,
            size,
        })
    }

    /// Stage a file that already exists on disk, leaving the original alone
    pub fn stage_path(
        path: impl AsRef<Path>,
        dir: impl AsRef<Path>,
        max_bytes: u64,
    ) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let source = File::open(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(FALLBACK_NAME);
        Self::stage(source, name, dir, max_bytes)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Open a fresh row source over the staged file
    pub fn rows(&self) -> Result<CsvRowSource<File>, SourceError> {
        let file = self.file.reopen()?;
        Ok(CsvRowSource::from_reader(file))
    }

    /// Delete the staged file
    pub fn release(self) -> io::Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        tracing::debug!("Released upload at {}", path.display());
        Ok(())
    }
}

/// Keep only the final path component; uploads never choose their directory
fn sanitize_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if base.is_empty() || base == "." || base == ".." {
        FALLBACK_NAME.to_string()
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_stage_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let payload = "Description,Amount\nCoffee,4.50\n";
        let artifact =
            UploadArtifact::stage(payload.as_bytes(), "bank.csv", dir.path(), 1024).unwrap();

        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(artifact.size(), payload.len() as u64);
        assert_eq!(artifact.original_name(), "bank.csv");
        let file_name = path.file_name().unwrap().to_str().unwrap();
        assert!(file_name.ends_with("-bank.csv"), "unexpected name {file_name}");
        assert_eq!(fs::read_to_string(&path).unwrap(), payload);

        artifact.release().unwrap();
        assert!(!path.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_drop_without_release_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let artifact =
                UploadArtifact::stage("x".as_bytes(), "a.csv", dir.path(), 1024).unwrap();
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_too_large_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let payload = vec![b'a'; 11];
        let result = UploadArtifact::stage(payload.as_slice(), "big.csv", dir.path(), 10);
        assert!(matches!(result, Err(SourceError::TooLarge { limit: 10 })));
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn test_exact_limit_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let payload = vec![b'a'; 10];
        let artifact = UploadArtifact::stage(payload.as_slice(), "ok.csv", dir.path(), 10).unwrap();
        assert_eq!(artifact.size(), 10);
    }

    #[test]
    fn test_same_name_twice_does_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let a = UploadArtifact::stage("1".as_bytes(), "same.csv", dir.path(), 16).unwrap();
        let b = UploadArtifact::stage("2".as_bytes(), "same.csv", dir.path(), 16).unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(entries(dir.path()), 2);
    }

    #[test]
    fn test_rows_reads_staged_payload() {
        let dir = tempfile::tempdir().unwrap();
        let payload = "Description,Amount\nCoffee,4.50\nTaxi,12\n";
        let artifact =
            UploadArtifact::stage(payload.as_bytes(), "bank.csv", dir.path(), 1024).unwrap();
        let rows: Vec<_> = artifact.rows().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].description(), Some("Taxi"));
    }

    #[test]
    fn test_stage_path_keeps_original() {
        let src_dir = tempfile::tempdir().unwrap();
        let uploads = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("march.csv");
        fs::write(&src, "Description,Amount\n").unwrap();

        let artifact = UploadArtifact::stage_path(&src, uploads.path(), 1024).unwrap();
        assert_eq!(artifact.original_name(), "march.csv");
        artifact.release().unwrap();
        assert!(src.exists());
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_name("C:\\Users\\me\\bank.csv"), "bank.csv");
        assert_eq!(sanitize_name(""), "upload.csv");
        assert_eq!(sanitize_name("dir/"), "upload.csv");
        assert_eq!(sanitize_name(".."), "upload.csv");
    }
}
