//! Product image storage.
//!
//! Images go to an S3-compatible bucket through the AWS SDK when S3 is
//! configured. When it is not, or the upload fails, the file is written under
//! the local upload directory and served from `/uploads`.

use std::path::{Path, PathBuf};

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region, RequestChecksumCalculation};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use crate::config::{S3Config, StorageConfig};

/// Largest accepted image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Public path prefix for locally stored files.
pub const LOCAL_URL_PREFIX: &str = "/uploads";

const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/png", ".png"),
    ("image/webp", ".webp"),
    ("image/avif", ".avif"),
];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unsupported file type. Allowed: JPEG, PNG, WebP, AVIF")]
    UnsupportedType(String),
    #[error("File is too large. Maximum size is 5MB")]
    TooLarge(usize),
    #[error("File is empty")]
    Empty,
    #[error("S3 upload failed: {0}")]
    S3(String),
    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Where an image ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    S3,
    Local,
}

/// S3 client bound to the product image bucket.
///
/// Path-style addressing, since S3-compatible providers rarely serve
/// virtual-hosted buckets.
#[derive(Debug, Clone)]
pub struct S3Bucket {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
}

impl S3Bucket {
    #[must_use]
    pub fn new(s3: &S3Config) -> Self {
        let credentials = Credentials::new(
            &s3.access_key_id,
            s3.secret_access_key.expose_secret(),
            None,
            None,
            "acsess-env",
        );
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(s3.region.clone()))
            .endpoint_url(&s3.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket: s3.bucket.clone(),
            endpoint: s3.endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// URL the object is served from once uploaded.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            uri_encode(&self.bucket),
            uri_encode_path(key)
        )
    }

    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::S3(DisplayErrorContext(&e).to_string()))?;
        Ok(self.public_url(key))
    }
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub url: String,
    pub backend: Backend,
}

/// Check the declared content type and size, returning the file extension.
///
/// # Errors
///
/// Returns `UnsupportedType`, `Empty` or `TooLarge`.
pub fn validate_image(content_type: &str, len: usize) -> Result<&'static str, StorageError> {
    let content_type = content_type.trim().to_ascii_lowercase();
    let ext = ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, ext)| *ext)
        .ok_or(StorageError::UnsupportedType(content_type))?;

    if len == 0 {
        return Err(StorageError::Empty);
    }
    if len > MAX_IMAGE_BYTES {
        return Err(StorageError::TooLarge(len));
    }
    Ok(ext)
}

/// Writes validated images to S3 or the local disk.
pub struct ImageStore<'a> {
    s3: Option<&'a S3Bucket>,
    config: &'a StorageConfig,
}

impl<'a> ImageStore<'a> {
    #[must_use]
    pub const fn new(s3: Option<&'a S3Bucket>, config: &'a StorageConfig) -> Self {
        Self { s3, config }
    }

    /// Store an image and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or `Io` when the local fallback also fails.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn store(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredImage, StorageError> {
        let ext = validate_image(content_type, bytes.len())?;
        let millis = Utc::now().timestamp_millis();

        if let Some(s3) = self.s3 {
            let key = format!("products/{millis}-{}", sanitize_file_name(file_name, ext));
            match s3.put(&key, content_type, bytes.clone()).await {
                Ok(url) => {
                    tracing::info!(key = %key, "Image uploaded to S3");
                    return Ok(StoredImage {
                        url,
                        backend: Backend::S3,
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "S3 upload failed, storing image locally");
                }
            }
        }

        let url = write_local(&self.config.upload_dir, &format!("{millis}{ext}"), &bytes).await?;
        tracing::info!(url = %url, "Image stored locally");
        Ok(StoredImage {
            url,
            backend: Backend::Local,
        })
    }
}

async fn write_local(upload_dir: &Path, name: &str, bytes: &[u8]) -> Result<String, StorageError> {
    let dir: PathBuf = upload_dir.join("products");
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(name), bytes).await?;
    Ok(format!("{LOCAL_URL_PREFIX}/products/{name}"))
}

/// Keep object keys to a predictable character set.
fn sanitize_file_name(name: &str, ext: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        format!("image{ext}")
    } else {
        cleaned.to_string()
    }
}

fn uri_encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn uri_encode_path(path: &str) -> String {
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn s3() -> S3Config {
        S3Config {
            endpoint: "https://s3.example.test".to_string(),
            region: "auto".to_string(),
            bucket: "acsess-products".to_string(),
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: SecretString::from("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY"),
        }
    }

    #[test]
    fn test_validate_image() {
        assert_eq!(validate_image("image/png", 10).unwrap(), ".png");
        assert_eq!(validate_image("IMAGE/JPEG", 10).unwrap(), ".jpg");
        assert!(matches!(
            validate_image("image/gif", 10),
            Err(StorageError::UnsupportedType(_))
        ));
        assert!(matches!(validate_image("image/png", 0), Err(StorageError::Empty)));
        assert!(matches!(
            validate_image("image/webp", MAX_IMAGE_BYTES + 1),
            Err(StorageError::TooLarge(_))
        ));
        assert!(validate_image("image/avif", MAX_IMAGE_BYTES).is_ok());
    }

    #[test]
    fn test_public_url_is_path_style() {
        let bucket = S3Bucket::new(&s3());
        assert_eq!(
            bucket.public_url("products/1-a b.png"),
            "https://s3.example.test/acsess-products/products/1-a%20b.png"
        );
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("ring.png", ".png"), "ring.png");
        assert_eq!(sanitize_file_name("../../etc/passwd", ".png"), "passwd");
        assert_eq!(sanitize_file_name("кольцо 1.jpg", ".jpg"), "_______1.jpg");
        assert_eq!(sanitize_file_name("", ".webp"), "image.webp");
    }

    #[test]
    fn test_uri_encode_path_keeps_slashes() {
        assert_eq!(uri_encode_path("products/a b.png"), "products/a%20b.png");
    }

    #[tokio::test]
    async fn test_local_fallback_without_s3() {
        let dir = std::env::temp_dir().join(format!("acsess-storage-{}", uuid::Uuid::new_v4()));
        let config = StorageConfig {
            upload_dir: dir.clone(),
            s3: None,
        };
        let stored = ImageStore::new(None, &config)
            .store("ring.png", "image/png", vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(stored.backend, Backend::Local);
        assert!(stored.url.starts_with("/uploads/products/"));
        assert!(stored.url.ends_with(".png"));
        let name = stored.url.rsplit('/').next().unwrap();
        let written = tokio::fs::read(dir.join("products").join(name)).await.unwrap();
        assert_eq!(written, vec![1, 2, 3]);
        let _ = tokio::fs::remove_dir_all(dir).await;
    }

    #[tokio::test]
    async fn test_unreachable_s3_falls_back_to_local() {
        let dir = std::env::temp_dir().join(format!("acsess-storage-{}", uuid::Uuid::new_v4()));
        let config = StorageConfig {
            upload_dir: dir.clone(),
            s3: None,
        };
        let mut unreachable = s3();
        unreachable.endpoint = "http://127.0.0.1:9".to_string();
        let bucket = S3Bucket::new(&unreachable);

        let stored = ImageStore::new(Some(&bucket), &config)
            .store("ring.webp", "image/webp", vec![7; 16])
            .await
            .unwrap();

        assert_eq!(stored.backend, Backend::Local);
        assert!(stored.url.ends_with(".webp"), "{}", stored.url);
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
