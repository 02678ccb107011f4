//! Private staging of uploaded audio
//!
//! Each upload is streamed into a uniquely named temporary file that is
//! deleted when its [`StagingFile`] handle is dropped, whether the request
//! completed, failed or was cancelled mid-flight.

use std::fmt::Display;
use std::path::Path;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

const STAGING_PREFIX: &str = "upload_";
const STAGING_SUFFIX: &str = ".wav";

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("staging I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read upload: {0}")]
    Read(String),

    #[error("upload exceeds {limit_bytes} bytes")]
    TooLarge { limit_bytes: u64 },

    #[error("upload is empty")]
    Empty,
}

/// Temporary file holding one uploaded audio payload
#[derive(Debug)]
pub struct StagingFile {
    file: NamedTempFile,
    len: u64,
}

impl StagingFile {
    /// Stream `stream` into a new staging file inside `dir`
    ///
    /// The file is removed again if the stream fails, exceeds `max_bytes`
    /// or turns out to be empty.
    pub async fn create_from_stream<S, E>(
        dir: &Path,
        stream: S,
        max_bytes: u64,
    ) -> Result<Self, StagingError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let named = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(dir)?;

        let mut writer = tokio::fs::File::from_std(named.reopen()?);
        let mut stream = std::pin::pin!(stream);
        let mut len: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StagingError::Read(e.to_string()))?;

            len += chunk.len() as u64;
            if len > max_bytes {
                return Err(StagingError::TooLarge {
                    limit_bytes: max_bytes,
                });
            }

            writer.write_all(&chunk).await?;
        }

        writer.flush().await?;
        drop(writer);

        if len == 0 {
            return Err(StagingError::Empty);
        }

        tracing::debug!(path = %named.path().display(), bytes = len, "Staged upload");

        Ok(Self { file: named, len })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read the staged payload back into memory
    pub async fn read_all(&self) -> std::io::Result<Bytes> {
        tokio::fs::read(self.file.path()).await.map(Bytes::from)
    }

    /// Delete the staging file now, surfacing any removal error
    pub fn close(self) -> std::io::Result<()> {
        self.file.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_and_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();

        let staged = StagingFile::create_from_stream(dir.path(), chunks(&[b"RIFF", b"WAVE"]), 1024)
            .await
            .unwrap();

        assert_eq!(staged.len(), 8);
        assert!(staged.path().starts_with(dir.path()));
        let name = staged.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("upload_"));
        assert!(name.ends_with(".wav"));
        assert_eq!(&staged.read_all().await.unwrap()[..], b"RIFFWAVE");
        assert_eq!(entries(dir.path()), 1);

        drop(staged);
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_close_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagingFile::create_from_stream(dir.path(), chunks(&[b"data"]), 1024)
            .await
            .unwrap();
        let path = staged.path().to_path_buf();

        staged.close().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_uploads_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = StagingFile::create_from_stream(dir.path(), chunks(&[b"a"]), 16)
            .await
            .unwrap();
        let b = StagingFile::create_from_stream(dir.path(), chunks(&[b"b"]), 16)
            .await
            .unwrap();

        assert_ne!(a.path(), b.path());
        assert_eq!(entries(dir.path()), 2);
    }

    #[tokio::test]
    async fn test_too_large_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = StagingFile::create_from_stream(dir.path(), chunks(&[b"12345", b"67890"]), 8)
            .await
            .unwrap_err();

        assert!(matches!(err, StagingError::TooLarge { limit_bytes: 8 }));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = StagingFile::create_from_stream(dir.path(), chunks(&[]), 8)
            .await
            .unwrap_err();

        assert!(matches!(err, StagingError::Empty));
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_stream_error_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let failing = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::other("connection reset")),
        ]);

        let err = StagingFile::create_from_stream(dir.path(), failing, 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, StagingError::Read(ref msg) if msg.contains("connection reset")));
        assert_eq!(entries(dir.path()), 0);
    }
}
