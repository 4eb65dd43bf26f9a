//! Response assembly
//!
//! generate → issue URL → record → response body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::{BarcodePipeline, BarcodeRequest, PipelineError};
use crate::store::{ArtifactStore, GenerationRecord, StoreError};
use crate::symbology::BarcodeFormat;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeResponse {
    #[serde(rename = "barcodeImageURL")]
    pub barcode_image_url: String,
    pub format: BarcodeFormat,
    /// RFC 3339
    pub creation_date: String,
}

pub fn respond(
    pipeline: &BarcodePipeline,
    store: &dyn ArtifactStore,
    request: &BarcodeRequest,
) -> Result<BarcodeResponse, ServiceError> {
    let artifact = pipeline.generate(request)?;
    let image_url = store.issue_url(&artifact)?;

    let record = GenerationRecord::new(request, &artifact, &image_url).map_err(StoreError::from)?;
    store.record(&record)?;

    Ok(BarcodeResponse {
        barcode_image_url: image_url,
        format: artifact.format,
        creation_date: artifact.created_at.to_rfc3339(),
    })
}
