//! Text storage capability used by the edit engine and the file handlers

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::sandbox::ResolvedPath;
use crate::types::{FsError, FsResult};

/// Read and write whole text files at already-validated paths.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn read(&self, path: &ResolvedPath) -> FsResult<String>;

    async fn write(&self, path: &ResolvedPath, content: &str) -> FsResult<()>;
}

/// [`ContentStore`] backed by the local filesystem, with a size cap.
#[derive(Debug, Clone)]
pub struct DiskStore {
    max_file_size: usize,
}

impl DiskStore {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    /// Reject content of `size` bytes when it exceeds the cap.
    pub fn check_size(&self, size: u64) -> FsResult<()> {
        if size > self.max_file_size as u64 {
            return Err(FsError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for DiskStore {
    async fn read(&self, path: &ResolvedPath) -> FsResult<String> {
        let io_err = |e| FsError::from_io(e, "read", path.requested());

        let file = fs::File::open(path.as_path()).await.map_err(io_err)?;
        let metadata = file.metadata().await.map_err(io_err)?;
        if metadata.is_dir() {
            return Err(FsError::InvalidPath(format!(
                "{} is a directory",
                path.requested()
            )));
        }
        self.check_size(metadata.len())?;

        // The file may grow after the metadata check; never buffer past the cap.
        let mut bytes = Vec::new();
        file.take(self.max_file_size as u64 + 1)
            .read_to_end(&mut bytes)
            .await
            .map_err(io_err)?;
        self.check_size(bytes.len() as u64)?;

        String::from_utf8(bytes).map_err(|e| FsError::Io {
            action: "read",
            path: path.requested().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }

    async fn write(&self, path: &ResolvedPath, content: &str) -> FsResult<()> {
        self.check_size(content.len() as u64)?;

        fs::write(path.as_path(), content)
            .await
            .map_err(|e| FsError::from_io(e, "write", path.requested()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{AllowedRoots, Sandbox};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Sandbox) {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(AllowedRoots::new(dir.path(), ["."]).unwrap());
        (dir, sandbox)
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (_dir, sandbox) = setup();
        let store = DiskStore::new(1024);
        let path = sandbox.validate("note.txt").unwrap();

        store.write(&path, "hello").await.unwrap();
        assert_eq!(store.read(&path).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let (_dir, sandbox) = setup();
        let store = DiskStore::new(1024);
        let path = sandbox.validate("missing.txt").unwrap();

        let err = store.read(&path).await.unwrap_err();
        assert!(matches!(err, FsError::NotFound(p) if p == "missing.txt"));
    }

    #[tokio::test]
    async fn test_size_cap() {
        let (dir, sandbox) = setup();
        std::fs::write(dir.path().join("big.txt"), "0123456789").unwrap();
        let store = DiskStore::new(4);
        let path = sandbox.validate("big.txt").unwrap();

        assert!(matches!(
            store.read(&path).await,
            Err(FsError::FileTooLarge { size: 10, max: 4 })
        ));
        assert!(matches!(
            store.write(&path, "too long").await,
            Err(FsError::FileTooLarge { .. })
        ));
        assert_eq!(std::fs::read_to_string(dir.path().join("big.txt")).unwrap(), "0123456789");
    }

    #[tokio::test]
    async fn test_content_at_cap_is_read() {
        let (dir, sandbox) = setup();
        std::fs::write(dir.path().join("edge.txt"), "abcd").unwrap();
        let store = DiskStore::new(4);
        let path = sandbox.validate("edge.txt").unwrap();

        assert_eq!(store.read(&path).await.unwrap(), "abcd");
    }

    #[tokio::test]
    async fn test_non_utf8_is_io_failure() {
        let (dir, sandbox) = setup();
        std::fs::write(dir.path().join("blob.bin"), [0x66, 0x6f, 0xff, 0xfe, 0x00]).unwrap();
        let store = DiskStore::new(1024);
        let path = sandbox.validate("blob.bin").unwrap();

        let err = store.read(&path).await.unwrap_err();
        assert!(matches!(err, FsError::Io { action: "read", .. }));
        assert_eq!(err.to_string(), "Failed to read blob.bin");
    }

    #[tokio::test]
    async fn test_reading_directory_is_rejected() {
        let (dir, sandbox) = setup();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let store = DiskStore::new(1024);
        let path = sandbox.validate("sub").unwrap();

        assert!(matches!(store.read(&path).await, Err(FsError::InvalidPath(_))));
    }
}
