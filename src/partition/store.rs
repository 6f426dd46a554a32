//! Partition storage (local filesystem, S3, GCS, Azure)
//!
//! A thin wrapper over `object_store` that keeps a printable root so every
//! file can be reported by the path an operator would recognise.

use crate::error::{Error, Result};
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::debug;

/// Storage root holding date-partitioned JSON files
#[derive(Debug, Clone)]
pub struct PartitionStore {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Path prefix within the bucket/container
    prefix: String,
    /// Root as given by the caller, used to build reported paths
    root: String,
    /// Scheme for logging (s3, gs, az, file, memory)
    scheme: String,
}

impl PartitionStore {
    /// Open an existing storage root for reading
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/`, `./path/` or `file:///path` - Local filesystem
    ///
    /// A local directory that does not exist is an error.
    pub fn open(url: &str) -> Result<Self> {
        Self::open_with(url, false)
    }

    /// Open a storage root for writing, creating a local directory if needed
    pub fn create(url: &str) -> Result<Self> {
        Self::open_with(url, true)
    }

    fn open_with(url: &str, create: bool) -> Result<Self> {
        if url.starts_with("s3://") {
            Self::open_bucket(url, "s3")
        } else if url.starts_with("gs://") {
            Self::open_bucket(url, "gs")
        } else if url.starts_with("az://") {
            Self::open_bucket(url, "az")
        } else {
            Self::open_local(url, create)
        }
    }

    /// In-memory store; `root` only affects reported paths
    pub fn in_memory(root: impl Into<String>) -> Self {
        Self::from_store(Arc::new(InMemory::new()), root, "memory")
    }

    /// Wrap an existing store
    pub fn from_store(
        store: Arc<dyn ObjectStore>,
        root: impl Into<String>,
        scheme: impl Into<String>,
    ) -> Self {
        Self {
            store,
            prefix: String::new(),
            root: root.into().trim_end_matches('/').to_string(),
            scheme: scheme.into(),
        }
    }

    /// Parse a bucket URL and build the matching store from environment credentials
    fn open_bucket(url: &str, scheme: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix(&format!("{scheme}://"))
            .ok_or_else(|| Error::config(format!("Invalid {scheme} URL: {url}")))?;

        let (bucket, prefix) = match without_scheme.find('/') {
            Some(idx) => (
                &without_scheme[..idx],
                without_scheme[idx + 1..].trim_matches('/').to_string(),
            ),
            None => (without_scheme, String::new()),
        };
        if bucket.is_empty() {
            return Err(Error::config(format!("Missing bucket in URL: {url}")));
        }

        let store: Arc<dyn ObjectStore> = match scheme {
            "s3" => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create S3 client: {e}")))?,
            ),
            "gs" => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?,
            ),
            _ => Arc::new(
                MicrosoftAzureBuilder::from_env()
                    .with_container_name(bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?,
            ),
        };

        Ok(Self {
            store,
            prefix,
            root: url.trim_end_matches('/').to_string(),
            scheme: scheme.to_string(),
        })
    }

    fn open_local(path: &str, create: bool) -> Result<Self> {
        let dir = path.strip_prefix("file://").unwrap_or(path);
        if dir.is_empty() {
            return Err(Error::config("Storage path is empty"));
        }

        if create {
            std::fs::create_dir_all(dir)
                .map_err(|e| Error::config(format!("Failed to create directory {dir}: {e}")))?;
        } else if !std::path::Path::new(dir).is_dir() {
            return Err(Error::config(format!("Partition root {dir} does not exist")));
        }

        let store = LocalFileSystem::new_with_prefix(dir)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self::from_store(Arc::new(store), dir, "file"))
    }

    /// Path of a stored file as reported to operators and the warehouse
    pub fn display_path(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        if self.root.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{relative}", self.root)
        }
    }

    fn object_path(&self, relative: &str) -> ObjectPath {
        let relative = relative.trim_matches('/');
        if self.prefix.is_empty() {
            ObjectPath::from(relative)
        } else {
            ObjectPath::from(format!("{}/{relative}", self.prefix))
        }
    }

    /// Write bytes, returning the reported path
    pub async fn put(&self, relative: &str, data: Bytes) -> Result<String> {
        let path = self.object_path(relative);
        self.store.put(&path, data.into()).await?;
        debug!("Wrote {path} ({})", self.scheme);
        Ok(self.display_path(relative))
    }

    /// Read a whole file
    pub async fn get(&self, relative: &str) -> Result<Bytes> {
        let path = self.object_path(relative);
        let bytes = self.store.get(&path).await?.bytes().await?;
        Ok(bytes)
    }

    /// Names of the files directly inside a directory, sorted.
    ///
    /// A directory that does not exist lists as empty.
    pub async fn list_files(&self, relative_dir: &str) -> Result<Vec<String>> {
        let prefix = self.object_path(relative_dir);
        let listing = match self.store.list_with_delimiter(Some(&prefix)).await {
            Ok(listing) => listing,
            Err(object_store::Error::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names: Vec<String> = listing
            .objects
            .iter()
            .filter_map(|meta| meta.location.filename().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}
