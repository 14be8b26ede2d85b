use std::{
    io,
    path::{Path, PathBuf},
};

use axum::body::Bytes;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::prelude::{AppError, FieldErrors};

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// An image as received from the client. The file name is informational only.
#[derive(Debug, Clone)]
pub struct PosterUpload {
    pub bytes: Bytes,
    pub file_name: Option<String>,
}

impl PosterUpload {
    pub fn new(bytes: impl Into<Bytes>, file_name: Option<String>) -> Self {
        PosterUpload {
            bytes: bytes.into(),
            file_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosterKind {
    Jpeg,
    Png,
}

impl PosterKind {
    pub fn sniff(bytes: &[u8]) -> Option<PosterKind> {
        if bytes.starts_with(JPEG_MAGIC) {
            Some(PosterKind::Jpeg)
        } else if bytes.starts_with(PNG_MAGIC) {
            Some(PosterKind::Png)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            PosterKind::Jpeg => "jpg",
            PosterKind::Png => "png",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            PosterKind::Jpeg => "image/jpeg",
            PosterKind::Png => "image/png",
        }
    }

    fn from_key(key: &str) -> Option<PosterKind> {
        match key.rsplit_once('.')?.1 {
            "jpg" => Some(PosterKind::Jpeg),
            "png" => Some(PosterKind::Png),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidAsset {
    #[error("The poster must be a file of type: jpg, jpeg, png.")]
    UnsupportedEncoding,
    #[error("The poster must not be greater than {max_kb} kilobytes.")]
    TooLarge { max_kb: usize },
    #[error("The poster failed to upload.")]
    Empty,
}

#[derive(Debug, Error)]
pub enum PosterError {
    #[error(transparent)]
    Invalid(#[from] InvalidAsset),
    #[error("failed to write poster: {0}")]
    Io(#[from] io::Error),
}

impl From<PosterError> for AppError {
    fn from(err: PosterError) -> Self {
        match err {
            PosterError::Invalid(invalid) => {
                AppError::Validation(FieldErrors::single("poster", invalid.to_string()))
            }
            PosterError::Io(e) => AppError::Io(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPoster {
    pub key: String,
    pub reference: String,
    pub kind: PosterKind,
}

/// What happened to a superseded poster file. Never an operation failure.
#[derive(Debug)]
pub enum Cleanup {
    NotNeeded,
    Removed(PathBuf),
    Missing(PathBuf),
    Failed { path: PathBuf, error: io::Error },
}

impl Cleanup {
    pub fn is_failure(&self) -> bool {
        matches!(self, Cleanup::Failed { .. })
    }

    /// Logs the outcome; failures at warn.
    pub fn log(&self) {
        match self {
            Cleanup::Failed { path, error } => {
                tracing::warn!("could not remove poster {}: {}", path.display(), error)
            }
            Cleanup::Removed(path) => tracing::debug!("removed poster {}", path.display()),
            Cleanup::Missing(path) => {
                tracing::debug!("poster {} already gone", path.display())
            }
            Cleanup::NotNeeded => {}
        }
    }
}

#[derive(Debug)]
pub struct Replaced {
    pub stored: StoredPoster,
    pub cleanup: Cleanup,
}

/// Poster files on the local filesystem, published under `public_base`.
#[derive(Debug, Clone)]
pub struct PosterStore {
    root: PathBuf,
    public_base: String,
    max_bytes: usize,
}

impl PosterStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>, max_bytes: usize) -> Self {
        PosterStore {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    pub fn validate(&self, upload: &PosterUpload) -> Result<PosterKind, InvalidAsset> {
        if upload.bytes.is_empty() {
            return Err(InvalidAsset::Empty);
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(InvalidAsset::TooLarge {
                max_kb: self.max_bytes / 1024,
            });
        }
        PosterKind::sniff(&upload.bytes).ok_or(InvalidAsset::UnsupportedEncoding)
    }

    pub async fn store(&self, upload: &PosterUpload) -> Result<StoredPoster, PosterError> {
        let kind = self.validate(upload)?;
        let key = format!("{}.{}", Uuid::new_v4(), kind.extension());
        fs::create_dir_all(&self.root).await?;

        let staging = self.root.join(format!(".{}.part", key));
        let target = self.root.join(&key);
        if let Err(e) = write_then_rename(&staging, &target, &upload.bytes).await {
            let _ = fs::remove_file(&staging).await;
            return Err(e.into());
        }
        tracing::info!(
            "stored poster {} ({} bytes, uploaded as {:?})",
            &key,
            upload.bytes.len(),
            upload.file_name
        );
        Ok(StoredPoster {
            reference: format!("{}/{}", self.public_base, key),
            key,
            kind,
        })
    }

    /// Stores the new poster, then removes the one it supersedes.
    pub async fn replace(
        &self,
        existing: Option<&str>,
        upload: &PosterUpload,
    ) -> Result<Replaced, PosterError> {
        let stored = self.store(upload).await?;
        let cleanup = self.remove(existing).await;
        Ok(Replaced { stored, cleanup })
    }

    pub async fn remove(&self, reference: Option<&str>) -> Cleanup {
        let Some(path) = reference.and_then(|r| self.path_for(r)) else {
            return Cleanup::NotNeeded;
        };
        match fs::remove_file(&path).await {
            Ok(()) => Cleanup::Removed(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Cleanup::Missing(path),
            Err(error) => Cleanup::Failed { path, error },
        }
    }

    /// Contents of a stored poster by key. Keys this store never generates,
    /// staging files included, read as missing.
    pub async fn open(&self, key: &str) -> io::Result<Option<(PosterKind, Bytes)>> {
        let Some(kind) = PosterKind::from_key(key).filter(|_| is_generated_key(key)) else {
            return Ok(None);
        };
        match fs::read(self.root.join(key)).await {
            Ok(bytes) => Ok(Some((kind, Bytes::from(bytes)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Local path of a reference this store issued. Anything that does not end
    /// in a generated key maps to nothing.
    pub fn path_for(&self, reference: &str) -> Option<PathBuf> {
        let name = reference.rsplit('/').next()?;
        is_generated_key(name).then(|| self.root.join(name))
    }
}

async fn write_then_rename(staging: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(staging).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(staging, target).await
}

fn is_generated_key(name: &str) -> bool {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    matches!(ext, "jpg" | "png") && stem.len() == 36 && Uuid::parse_str(stem).is_ok()
}
