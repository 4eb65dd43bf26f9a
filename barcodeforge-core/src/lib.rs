//! Barcode Forge Core - product data validation and barcode rendering
//!
//! # Two Pipelines
//! 1. Validation folds every violation into a result; it never fails
//! 2. Generation is pure: same request, same image bytes
//!
//! Persistence and URL issuance are injected through [`store::ArtifactStore`].

pub mod config;
pub mod validation;
pub mod symbology;
pub mod encoding;
pub mod render;
pub mod hashing;
pub mod pipeline;
pub mod store;
pub mod response;

pub use config::{ConfigError, PipelineConfig};
pub use validation::{validate, Payload, ProductRecord, ValidationResult, Validator};
pub use symbology::{BarcodeFormat, IdentifierSource};
pub use encoding::EncodeError;
pub use hashing::{canonical_json, compute_request_hash, sha256_hex};
pub use pipeline::{BarcodeArtifact, BarcodePipeline, BarcodeRequest, PipelineError};
pub use store::{ArtifactStore, DirectoryStore, GenerationRecord, InlineStore, StoreError};
pub use response::{respond, BarcodeResponse, ServiceError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
