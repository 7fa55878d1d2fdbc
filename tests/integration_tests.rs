//! Integration tests for pdf-forge with realistic PDF scenarios.

mod common;

use common::single_page_pdf;
use pdf_forge::core::{PDFDocument, PDFError};

#[test]
fn test_basic_pdf_parsing() {
    let pdf_data = single_page_pdf("Test PDF");
    let mut doc = PDFDocument::open(pdf_data).expect("Failed to parse test PDF");

    assert_eq!(doc.page_count().unwrap(), 1);

    let page = doc.get_page(0).expect("Failed to get first page");
    assert_eq!(page.index(), 0);

    let media_box = doc.get_media_box(&page).expect("page should have a MediaBox");
    let arr = media_box.as_array().unwrap();
    assert_eq!(arr[2].as_f64(), Some(612.0));
    assert_eq!(arr[3].as_f64(), Some(792.0));
}

#[test]
fn test_error_recovery() {
    let malformed_pdf = b"Not a PDF file";
    let result = PDFDocument::open(malformed_pdf.to_vec());
    assert!(result.is_err(), "Should fail to parse malformed PDF");

    let error_str = format!("{}", result.err().unwrap());
    assert!(!error_str.is_empty());
}

#[test]
fn test_concurrent_access() {
    use std::sync::Arc;
    use std::thread;

    let pdf_data = Arc::new(single_page_pdf("Test PDF"));
    let mut handles = Vec::new();

    for i in 0..4 {
        let data_clone = Arc::clone(&pdf_data);
        let handle = thread::spawn(move || {
            let mut doc = PDFDocument::open((*data_clone).clone()).expect("Thread failed to parse PDF");
            let page_count = doc.page_count().expect("Failed to get page count");
            assert_eq!(page_count, 1);

            let page = doc.get_page(0).expect("Failed to get page");
            assert_eq!(page.index(), 0);

            format!("Thread {} completed successfully", i)
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }
}

#[test]
fn test_small_pdf_with_empty_page_tree() {
    let small_pdf = b"%PDF-1.1\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\nxref\n0 3\n0000000000 65535 f \n0000000009 00000 n \n0000000058 00000 n \ntrailer\n<< /Size 3 /Root 1 0 R >>\nstartxref\n110\n%%EOF".to_vec();

    let mut doc = PDFDocument::open(small_pdf).expect("Failed to parse small PDF");
    assert_eq!(doc.page_count().unwrap(), 0);
}

#[test]
fn test_unicode_text_in_content_stream() {
    let mut pdf_data = single_page_pdf("Test PDF");

    if let Some(pos) = pdf_data
        .windows(b"(Test PDF)".len())
        .position(|window| window == b"(Test PDF)")
    {
        pdf_data.splice(pos..pos + b"(Test PDF)".len(), b"(Hello World)".iter().cloned());
    }

    // The byte-for-byte substitution shifts /Length and xref offsets out of
    // sync; the parser should still recover the document structure since it
    // locates objects by scanning rather than trusting /Length blindly for
    // re-derivation here, but at minimum must not panic.
    let result = PDFDocument::open(pdf_data);
    match result {
        Ok(_) => {}
        Err(PDFError::Generic(_)) | Err(PDFError::XRefError { .. }) => {}
        Err(other) => panic!("Unexpected error variant: {other}"),
    }
}
