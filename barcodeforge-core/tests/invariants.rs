//! Contract Invariant Tests
//!
//! These tests verify the guarantees callers rely on.

use barcodeforge_core::{
    render::read_png_info,
    respond, validate, BarcodeFormat, BarcodePipeline, BarcodeRequest, DirectoryStore,
    PipelineError, ValidationResult,
};
use serde_json::json;

fn pipeline() -> BarcodePipeline {
    BarcodePipeline::default()
}

#[test]
fn invariant_blank_codes_name_the_field() {
    for field in ["upc", "ean"] {
        for blank in ["", "   ", "\t"] {
            let mut record = json!({"sku": "SKU-1", "name": "Widget"});
            record[field] = json!(blank);

            let result = validate("json", record);
            assert!(!result.is_valid);
            assert!(
                result.errors.iter().any(|e| e.starts_with(&format!("{field}: "))),
                "{field}={blank:?} gave {:?}",
                result.errors
            );
        }
    }
}

#[test]
fn invariant_empty_batch_is_valid() {
    assert_eq!(validate("json", json!([])), ValidationResult::success());
}

#[test]
fn invariant_blank_csv_rows_reported() {
    let result = validate("csv", "a\n\n  \nb");
    assert!(!result.is_valid);
    assert_eq!(result.errors, vec!["Empty row found.", "Empty row found."]);
}

#[test]
fn invariant_unsupported_data_format() {
    let result = validate("xml", json!({}));
    assert!(!result.is_valid);
    assert_eq!(result.errors, vec!["Unsupported data format: xml"]);
}

#[test]
fn invariant_is_valid_matches_errors() {
    let payloads = [
        ("json", json!({"sku": "A", "name": "n"})),
        ("JSON", json!([{"sku": ""}, {"name": 1}])),
        ("csv", json!("x\n\ny")),
        ("csv", json!(["x"])),
        ("yaml", json!("x")),
    ];
    for (format, payload) in payloads {
        let result = validate(format, payload);
        assert_eq!(result.is_valid, result.errors.is_empty());
    }
}

#[test]
fn invariant_default_render_has_300_dpi_and_native_size() {
    let request = BarcodeRequest::new("EAN_13").sku("123456789012");
    let artifact = pipeline().generate(&request).unwrap();

    let info = read_png_info(&artifact.image_bytes).unwrap();
    assert_eq!(info.dpi, Some((300, 300)));
    // 95 modules plus a 10-module quiet zone each side, 2 px per module.
    assert_eq!((info.width, info.height), (230, 140));
    assert_eq!((artifact.width, artifact.height, artifact.dpi), (230, 140, 300));
    assert_eq!(artifact.format, BarcodeFormat::Ean13);
}

#[test]
fn invariant_size_is_exact() {
    let request = BarcodeRequest::new("EAN_13").sku("123456789012").size("400x200");
    let artifact = pipeline().generate(&request).unwrap();

    let info = read_png_info(&artifact.image_bytes).unwrap();
    assert_eq!((info.width, info.height), (400, 200));
}

#[test]
fn invariant_resolution_is_stored() {
    let request = BarcodeRequest::new("CODE_128").sku("SKU-7").resolution(600);
    let artifact = pipeline().generate(&request).unwrap();
    assert_eq!(read_png_info(&artifact.image_bytes).unwrap().dpi, Some((600, 600)));
}

#[test]
fn invariant_missing_identifier() {
    let request = BarcodeRequest::new("EAN_13");
    let err = pipeline().generate(&request).unwrap_err();
    assert!(matches!(err, PipelineError::MissingIdentifier));
}

#[test]
fn invariant_invalid_format() {
    let request = BarcodeRequest::new("QR_CODE").sku("123456789012");
    let err = pipeline().generate(&request).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidFormat(f) if f == "QR_CODE"));
}

#[test]
fn invariant_invalid_geometry() {
    for size in ["400", "400x0", "widexhigh"] {
        let request = BarcodeRequest::new("CODE_128").sku("SKU-1").size(size);
        let err = pipeline().generate(&request).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidGeometry(_)), "{size}");
    }
}

#[test]
fn invariant_generation_is_idempotent() {
    let request = BarcodeRequest::new("CODE_128")
        .sku("SKU-123")
        .size("300x120")
        .color("#1a2b3c")
        .resolution(150);

    let a = pipeline().generate(&request).unwrap();
    let b = pipeline().generate(&request).unwrap();
    assert_eq!(a.image_bytes, b.image_bytes);
    assert_eq!(a.content_hash, b.content_hash);
}

#[test]
fn invariant_parallel_generation_agrees() {
    let pipeline = pipeline();
    let request = BarcodeRequest::new("UPC_A").upc("036000291452");
    let expected = pipeline.generate(&request).unwrap().image_bytes;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| pipeline.generate(&request).unwrap().image_bytes))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn invariant_respond_persists_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirectoryStore::new(dir.path())
        .unwrap()
        .with_base_url("https://img.example.com");
    let request = BarcodeRequest::new("EAN_13").ean("4006381333931");

    let response = respond(&pipeline(), &store, &request).unwrap();
    assert!(response.barcode_image_url.starts_with("https://img.example.com/barcode_"));
    assert_eq!(response.format, BarcodeFormat::Ean13);

    let records = store.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].image, response.barcode_image_url);
    assert_eq!(records[0].ean.as_deref(), Some("4006381333931"));
}
