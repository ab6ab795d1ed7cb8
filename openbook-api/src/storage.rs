//! Media storage strategy.
//!
//! The backend is chosen exactly once, at startup, from the immutable
//! configuration: production routes media to a private S3 bucket, everything
//! else to the local filesystem under `media_root`. Request handlers receive
//! the resolved strategy and never branch on the environment themselves, so
//! changing `ENVIRONMENT` only takes effect after a restart.

use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::put_object::PutObjectError;
use aws_sdk_s3::primitives::ByteStream;
use openbook_common::config::OpenbookConfig;
use openbook_common::model::post::MediaLocation;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum StorageKind {
    Local,
    S3,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(
        "Production storage requires AWS_STORAGE_BUCKET_NAME and AWS_PRIVATE_MEDIA_LOCATION"
    )]
    MissingS3Config,
    #[error("Error writing media to the local filesystem: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error uploading media to S3: {0}")]
    S3(#[from] SdkError<PutObjectError>),
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
pub enum UploadValidationError {
    #[default]
    #[error("The upload has no content type.")]
    MissingContentType,
    #[error("Unsupported media content type: {0}")]
    UnsupportedMediaType(String),
    #[error("The upload is {size} bytes, the maximum is {max}.")]
    TooLarge { size: u64, max: u64 },
}

/// Rejects uploads outside the MIME allow-list or over the configured size.
pub fn validate_upload(
    content_type: &str,
    size: u64,
    config: &OpenbookConfig,
) -> Result<(), UploadValidationError> {
    if !OpenbookConfig::is_supported_media_type(content_type) {
        return Err(UploadValidationError::UnsupportedMediaType(
            content_type.to_owned(),
        ));
    }
    if size > config.post_image_max_size {
        return Err(UploadValidationError::TooLarge {
            size,
            max: config.post_image_max_size,
        });
    }
    Ok(())
}

/// File extension for a supported media content type.
#[must_use]
pub fn media_extension(content_type: &str) -> &'static str {
    match content_type {
        "video/mp4" => "mp4",
        "video/3gpp" => "3gp",
        "image/gif" => "gif",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        _ => "bin",
    }
}

pub enum MediaStorage {
    Local {
        root: PathBuf,
    },
    S3 {
        client: Client,
        bucket: String,
        location: String,
    },
}

impl MediaStorage {
    pub async fn from_config(config: &OpenbookConfig) -> Result<Self, StorageError> {
        if config.environment.is_production() {
            let bucket = config
                .aws_storage_bucket_name
                .clone()
                .ok_or(StorageError::MissingS3Config)?;
            let location = config
                .aws_private_media_location
                .clone()
                .ok_or(StorageError::MissingS3Config)?;

            let aws_config = aws_config::load_from_env().await;
            Ok(MediaStorage::S3 {
                client: Client::new(&aws_config),
                bucket,
                location,
            })
        } else {
            Ok(MediaStorage::Local {
                root: config.media_root.clone(),
            })
        }
    }

    #[must_use]
    pub fn kind(&self) -> StorageKind {
        match self {
            MediaStorage::Local { .. } => StorageKind::Local,
            MediaStorage::S3 { .. } => StorageKind::S3,
        }
    }

    pub async fn store(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaLocation, StorageError> {
        match self {
            MediaStorage::Local { root } => {
                let path = root.join(key);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, &bytes).await?;
                Ok(MediaLocation(path.to_string_lossy().into_owned()))
            }
            MediaStorage::S3 {
                client,
                bucket,
                location,
            } => {
                let key = format!("{location}/{key}");
                client
                    .put_object()
                    .bucket(bucket)
                    .key(&key)
                    .content_type(content_type)
                    .body(ByteStream::from(bytes))
                    .send()
                    .await?;
                Ok(MediaLocation(key))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{
        MediaStorage, StorageError, StorageKind, UploadValidationError, validate_upload,
    };
    use openbook_common::config::{Environment, OpenbookConfig};

    fn config(environment: Environment) -> OpenbookConfig {
        OpenbookConfig::with_defaults(environment, "postgres://".to_owned())
    }

    #[tokio::test]
    async fn non_production_selects_local_storage() {
        for environment in [Environment::Development, Environment::Test] {
            let storage = MediaStorage::from_config(&config(environment)).await.unwrap();
            assert_eq!(storage.kind(), StorageKind::Local);
        }
    }

    #[tokio::test]
    async fn production_selects_s3_storage() {
        let mut config = config(Environment::Production);
        config.aws_storage_bucket_name = Some("openbook-media".to_owned());
        config.aws_private_media_location = Some("media/private".to_owned());

        let storage = MediaStorage::from_config(&config).await.unwrap();
        assert_eq!(storage.kind(), StorageKind::S3);
    }

    #[tokio::test]
    async fn production_without_bucket_fails_at_startup() {
        let result = MediaStorage::from_config(&config(Environment::Production)).await;
        assert!(matches!(result, Err(StorageError::MissingS3Config)));
    }

    #[tokio::test]
    async fn local_store_writes_under_root() {
        let root = std::env::temp_dir().join(format!(
            "openbook-storage-test-{}",
            std::process::id()
        ));
        let storage = MediaStorage::Local { root: root.clone() };

        let location = storage
            .store("post-images/1.png", "image/png", vec![0x89, 0x50])
            .await
            .unwrap();

        let stored = tokio::fs::read(&location.0).await.unwrap();
        assert_eq!(stored, vec![0x89, 0x50]);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[test]
    fn extensions_follow_content_type() {
        assert_eq!(super::media_extension("image/png"), "png");
        assert_eq!(super::media_extension("video/3gpp"), "3gp");
        assert_eq!(super::media_extension("application/octet-stream"), "bin");
    }

    #[test]
    fn upload_validation() {
        let config = config(Environment::Test);

        assert!(validate_upload("image/png", 1024, &config).is_ok());
        assert!(validate_upload("video/mp4", 1024, &config).is_ok());

        assert_eq!(
            validate_upload("application/pdf", 1024, &config),
            Err(UploadValidationError::UnsupportedMediaType(
                "application/pdf".to_owned()
            ))
        );
        assert_eq!(
            validate_upload("image/png", config.post_image_max_size + 1, &config),
            Err(UploadValidationError::TooLarge {
                size: config.post_image_max_size + 1,
                max: config.post_image_max_size,
            })
        );
        assert!(validate_upload("image/png", config.post_image_max_size, &config).is_ok());
    }
}
