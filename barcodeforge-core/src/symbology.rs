//! Symbology registry
//!
//! The enumerated set of barcode formats and the identifier precedence rule.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarcodeFormat {
    #[serde(rename = "EAN_13")]
    Ean13,
    #[serde(rename = "UPC_A")]
    UpcA,
    #[serde(rename = "CODE_128")]
    Code128,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 3] = [Self::Ean13, Self::UpcA, Self::Code128];

    /// Resolve a format tag. Accepts the canonical names and the short
    /// aliases (`ean13`, `upc`, `code128`), case-insensitively.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "EAN_13" | "EAN13" => Some(Self::Ean13),
            "UPC_A" | "UPC" => Some(Self::UpcA),
            "CODE_128" | "CODE128" => Some(Self::Code128),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ean13 => "EAN_13",
            Self::UpcA => "UPC_A",
            Self::Code128 => "CODE_128",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Self::Ean13 => "ean13",
            Self::UpcA => "upc",
            Self::Code128 => "code128",
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which identifier supplied the content string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierSource {
    Upc,
    Ean,
    Sku,
}

/// Pick the content string: upc, then ean, then sku. Blank values count as absent.
pub fn resolve_content<'a>(
    sku: Option<&'a str>,
    upc: Option<&'a str>,
    ean: Option<&'a str>,
) -> Option<(IdentifierSource, &'a str)> {
    let usable = |value: Option<&'a str>| value.filter(|v| !v.trim().is_empty());

    usable(upc)
        .map(|v| (IdentifierSource::Upc, v))
        .or_else(|| usable(ean).map(|v| (IdentifierSource::Ean, v)))
        .or_else(|| usable(sku).map(|v| (IdentifierSource::Sku, v)))
}
