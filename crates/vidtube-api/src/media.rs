//! Managed media host.
//!
//! Uploaded files never live in the database; the store only keeps the
//! host's URL and asset id. Two backends exist: a Cloudinary-compatible
//! signed REST API, and a local directory that the server exposes under
//! `/media`.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use vidtube_types::models::MediaAsset;

use crate::upload::FilePart;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Media host request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media host rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Media storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid asset id: {0}")]
    InvalidAssetId(String),
}

/// What sort of file is being stored. Hosts keep images and videos apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    fn resource_type(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    fn local_dir(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
        }
    }
}

/// Result of a successful upload. `duration` is only known when the host
/// probed the file.
#[derive(Debug, Clone)]
pub struct Uploaded {
    pub asset: MediaAsset,
    pub duration: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

pub enum MediaHost {
    Cloudinary {
        config: CloudinaryConfig,
        client: reqwest::Client,
    },
    Local {
        dir: PathBuf,
        base_url: String,
    },
}

#[derive(Deserialize)]
struct CloudinaryUpload {
    secure_url: String,
    public_id: String,
    duration: Option<f64>,
}

impl MediaHost {
    pub fn cloudinary(config: CloudinaryConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        info!("Media host: Cloudinary cloud '{}'", config.cloud_name);
        Ok(Self::Cloudinary { config, client })
    }

    /// Files are written under `dir` and served from `{base_url}/media/...`.
    pub fn local(dir: PathBuf, base_url: impl Into<String>) -> Self {
        info!("Media host: local directory {}", dir.display());
        Self::Local {
            dir,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn upload(&self, file: &FilePart, kind: MediaKind) -> Result<Uploaded, MediaError> {
        match self {
            Self::Cloudinary { config, client } => {
                let timestamp = chrono::Utc::now().timestamp().to_string();
                let signature = sign(&[("timestamp", &timestamp)], &config.api_secret);

                let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.file_name.clone());
                if let Some(content_type) = &file.content_type {
                    part = part.mime_str(content_type)?;
                }
                let form = Form::new()
                    .part("file", part)
                    .text("api_key", config.api_key.clone())
                    .text("timestamp", timestamp)
                    .text("signature", signature);

                let url = format!(
                    "https://api.cloudinary.com/v1_1/{}/{}/upload",
                    config.cloud_name,
                    kind.resource_type()
                );
                let response = client.post(url).multipart(form).send().await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(MediaError::Rejected { status: status.as_u16(), body });
                }

                let uploaded: CloudinaryUpload = response.json().await?;
                debug!(public_id = %uploaded.public_id, "Uploaded to Cloudinary");
                Ok(Uploaded {
                    asset: MediaAsset {
                        url: uploaded.secure_url,
                        public_id: uploaded.public_id,
                    },
                    duration: uploaded.duration,
                })
            }
            Self::Local { dir, base_url } => {
                let name = format!("{}.{}", Uuid::new_v4(), extension(&file.file_name));
                let public_id = format!("{}/{}", kind.local_dir(), name);

                let target_dir = dir.join(kind.local_dir());
                tokio::fs::create_dir_all(&target_dir).await?;
                tokio::fs::write(target_dir.join(&name), &file.bytes).await?;

                debug!(%public_id, size = file.bytes.len(), "Stored media locally");
                Ok(Uploaded {
                    asset: MediaAsset {
                        url: format!("{base_url}/media/{public_id}"),
                        public_id,
                    },
                    duration: None,
                })
            }
        }
    }

    pub async fn delete(&self, public_id: &str, kind: MediaKind) -> Result<(), MediaError> {
        match self {
            Self::Cloudinary { config, client } => {
                let timestamp = chrono::Utc::now().timestamp().to_string();
                let signature = sign(
                    &[("public_id", public_id), ("timestamp", &timestamp)],
                    &config.api_secret,
                );

                let form = Form::new()
                    .text("public_id", public_id.to_string())
                    .text("api_key", config.api_key.clone())
                    .text("timestamp", timestamp)
                    .text("signature", signature);

                let url = format!(
                    "https://api.cloudinary.com/v1_1/{}/{}/destroy",
                    config.cloud_name,
                    kind.resource_type()
                );
                let response = client.post(url).multipart(form).send().await?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(MediaError::Rejected { status: status.as_u16(), body });
                }
                Ok(())
            }
            Self::Local { dir, .. } => {
                let path = local_path(dir, public_id, kind)?;
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => Ok(()),
                    // already gone
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

/// Cloudinary request signature: parameters sorted by name, joined as a
/// query string, secret appended, SHA-1 hex.
fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by_key(|(name, _)| *name);
    let joined = sorted
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

/// Resolve a local asset id to a path inside the media directory. Only
/// `<kind dir>/<file name>` is accepted.
fn local_path(dir: &Path, public_id: &str, kind: MediaKind) -> Result<PathBuf, MediaError> {
    let relative = Path::new(public_id);
    let mut components = relative.components();
    let valid = matches!(
        components.next(),
        Some(Component::Normal(first)) if first == kind.local_dir()
    ) && matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();

    if !valid {
        return Err(MediaError::InvalidAssetId(public_id.to_string()));
    }
    Ok(dir.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn part(name: &str, data: &'static [u8]) -> FilePart {
        FilePart {
            file_name: name.to_string(),
            content_type: None,
            bytes: Bytes::from_static(data),
        }
    }

    #[test]
    fn signature_sorts_params() {
        let a = sign(&[("timestamp", "1"), ("public_id", "x")], "s");
        let b = sign(&[("public_id", "x"), ("timestamp", "1")], "s");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(extension("clip.MP4"), "mp4");
        assert_eq!(extension("noext"), "bin");
        assert_eq!(extension("evil.p/h"), "bin");
    }

    #[test]
    fn local_paths_cannot_escape() {
        let dir = Path::new("/srv/media");
        assert!(local_path(dir, "images/a.png", MediaKind::Image).is_ok());
        assert!(local_path(dir, "videos/a.mp4", MediaKind::Image).is_err());
        assert!(local_path(dir, "images/../secret", MediaKind::Image).is_err());
        assert!(local_path(dir, "/etc/passwd", MediaKind::Image).is_err());
    }

    #[tokio::test]
    async fn local_upload_then_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let host = MediaHost::local(tmp.path().to_path_buf(), "http://localhost:8000/");

        let uploaded = host.upload(&part("me.png", b"png"), MediaKind::Image).await.unwrap();
        assert!(uploaded.asset.url.starts_with("http://localhost:8000/media/images/"));
        assert!(uploaded.duration.is_none());

        let stored = tmp.path().join(&uploaded.asset.public_id);
        assert_eq!(std::fs::read(&stored).unwrap(), b"png");

        host.delete(&uploaded.asset.public_id, MediaKind::Image).await.unwrap();
        assert!(!stored.exists());
        // deleting twice is fine
        host.delete(&uploaded.asset.public_id, MediaKind::Image).await.unwrap();
    }
}
