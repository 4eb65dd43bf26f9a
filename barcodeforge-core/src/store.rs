//! Artifact stores
//!
//! URL issuance and generation records are an injected capability. The
//! pipeline never touches a store; [`crate::response::respond`] composes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::hashing::compute_request_hash;
use crate::pipeline::{BarcodeArtifact, BarcodeRequest};
use crate::symbology::BarcodeFormat;
use crate::ENGINE_VERSION;

pub const RECORDS_FILE: &str = "records.jsonl";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What gets persisted for one generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub sku: Option<String>,
    pub upc: Option<String>,
    pub ean: Option<String>,
    pub format: BarcodeFormat,
    pub size: Option<String>,
    pub color: Option<String>,
    /// Effective DPI, default applied
    pub resolution: u32,
    pub image: String,
    pub content_hash: String,
    pub request_hash: String,
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    pub fn new(
        request: &BarcodeRequest,
        artifact: &BarcodeArtifact,
        image_url: &str,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            sku: request.sku.clone(),
            upc: request.upc.clone(),
            ean: request.ean.clone(),
            format: artifact.format,
            size: request.size.clone(),
            color: request.color.clone(),
            resolution: artifact.dpi,
            image: image_url.to_string(),
            content_hash: artifact.content_hash.clone(),
            request_hash: compute_request_hash(request, ENGINE_VERSION)?,
            created_at: artifact.created_at,
        })
    }
}

pub trait ArtifactStore {
    /// Make the image retrievable and return its URL.
    fn issue_url(&self, artifact: &BarcodeArtifact) -> Result<String, StoreError>;

    fn record(&self, record: &GenerationRecord) -> Result<(), StoreError>;
}

/// Writes images as `barcode_<sha256>.png` and appends records as JSON lines.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    base_url: Option<String>,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, base_url: None })
    }

    /// Serve URLs as `<base_url>/<file name>` instead of local paths.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> Result<Vec<GenerationRecord>, StoreError> {
        let path = self.root.join(RECORDS_FILE);
        if !path.exists() {
            return Ok(vec![]);
        }
        let reader = BufReader::new(fs::File::open(path)?);
        let mut records = vec![];
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(&line)?);
            }
        }
        Ok(records)
    }
}

impl ArtifactStore for DirectoryStore {
    fn issue_url(&self, artifact: &BarcodeArtifact) -> Result<String, StoreError> {
        let name = artifact.file_name();
        let path = self.root.join(&name);

        // Same content, same name: an existing file already holds these bytes.
        if !path.exists() {
            fs::write(&path, &artifact.image_bytes)?;
            tracing::debug!(path = %path.display(), "wrote barcode image");
        }

        Ok(match &self.base_url {
            Some(base) => format!("{}/{}", base, name),
            None => path.display().to_string(),
        })
    }

    fn record(&self, record: &GenerationRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(RECORDS_FILE))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Embeds the image in a `data:` URL and keeps no records.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStore;

impl ArtifactStore for InlineStore {
    fn issue_url(&self, artifact: &BarcodeArtifact) -> Result<String, StoreError> {
        Ok(artifact.to_data_url())
    }

    fn record(&self, record: &GenerationRecord) -> Result<(), StoreError> {
        tracing::debug!(content_hash = %record.content_hash, "inline store keeps no records");
        Ok(())
    }
}
