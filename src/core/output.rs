//! Public output directory for converted audio

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use uuid::Uuid;

/// Generate a collision-free output file name (`converted_<uuid>.<ext>`)
pub fn generate_output_filename(extension: &str) -> String {
    format!("converted_{}.{extension}", Uuid::new_v4())
}

/// A converted file that is visible under the static mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedAudio {
    pub file_name: String,
    pub path: PathBuf,
    /// Site-relative URL, e.g. `/static/audio/converted_<uuid>.mp3`
    pub url: String,
}

/// Writes converted audio into the public output directory
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
    public_prefix: String,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the output directory if it does not exist yet
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Publish `data` under a fresh name
    ///
    /// The bytes land in a hidden partial file first and are then linked to
    /// their final name, so a reader never observes a half-written file.
    pub async fn publish(&self, data: Bytes, extension: &str) -> std::io::Result<PublishedAudio> {
        let dir = self.dir.clone();
        let file_name = generate_output_filename(extension);
        let final_path = dir.join(&file_name);

        let target = final_path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;

            let mut partial = tempfile::Builder::new()
                .prefix(".partial_")
                .tempfile_in(&dir)?;
            partial.write_all(&data)?;
            partial.as_file().sync_all()?;
            partial.persist_noclobber(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)??;

        let url = format!("{}/{}", self.public_prefix, file_name);
        tracing::debug!(path = %final_path.display(), %url, "Published converted audio");

        Ok(PublishedAudio {
            file_name,
            path: final_path,
            url,
        })
    }
}
