//! Real-world PDF scenario tests: parsing, page access, error handling,
//! and thread safety under concurrent access.

mod common;

use common::single_page_pdf;
use pdf_forge::core::PDFDocument;

#[test]
fn test_proven_pdf_functionality() {
    let pdf_data = single_page_pdf("Hello World");
    let mut doc = PDFDocument::open(pdf_data).expect("Failed to parse proven working PDF");

    assert_eq!(doc.page_count().unwrap(), 1);

    let page = doc.get_page(0).expect("Failed to get page");
    assert_eq!(page.index(), 0);

    let resources = doc.get_resources(&page).expect("page should have resources");
    assert!(resources.as_dictionary().unwrap().contains_key("Font"));
}

#[test]
fn test_performance_characteristics() {
    use std::time::Instant;

    let pdf_data = single_page_pdf("Hello World");

    let start = Instant::now();
    let mut doc = PDFDocument::open(pdf_data).expect("Failed to parse PDF");
    let parse_time = start.elapsed();

    let start = Instant::now();
    for _ in 0..10 {
        let _page = doc.get_page(0).expect("Failed to get page");
    }
    let access_time = start.elapsed();

    assert!(parse_time.as_millis() < 50, "Parsing should be fast for simple PDFs");
    assert!(access_time.as_millis() < 10, "Repeated page access should be cached and fast");
}

#[test]
fn test_error_handling_gracefully() {
    let test_cases = vec![
        ("Empty PDF", vec![]),
        ("Not a PDF", b"This is not a PDF file".to_vec()),
        ("Truncated PDF", b"%PDF-1.4".to_vec()),
    ];

    for (name, pdf_data) in test_cases {
        let result = PDFDocument::open(pdf_data);
        assert!(result.is_err(), "{} should fail to parse", name);

        let error = result.err().unwrap();
        let error_str = format!("{}", error);
        assert!(!error_str.is_empty(), "{} should have meaningful error message", name);
    }
}

#[test]
fn test_memory_safety_concurrent_access() {
    use std::sync::Arc;
    use std::thread;

    let pdf_data = Arc::new(single_page_pdf("Hello World"));
    let mut handles = Vec::new();

    for i in 0..3 {
        let pdf_clone = Arc::clone(&pdf_data);
        let handle = thread::spawn(move || {
            let mut doc = PDFDocument::open((*pdf_clone).clone()).expect("Thread failed to parse PDF");

            let mut page_counts = Vec::new();
            for _ in 0..5 {
                let page = doc.get_page(0).expect("Failed to get page");
                page_counts.push(page.index());
            }

            (i, page_counts)
        });

        handles.push(handle);
    }

    for handle in handles {
        let (_thread_id, page_counts) = handle.join().expect("Thread panicked");
        assert_eq!(page_counts, vec![0, 0, 0, 0, 0]);
    }
}
