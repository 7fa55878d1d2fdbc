//! Shared fixture builders for integration tests.
//!
//! Builds minimal, well-formed PDFs with a dynamically computed classic
//! cross-reference table, so offsets never drift out of sync with the body.

#![allow(dead_code)]

/// Assembles a one-section xref PDF from a header and a list of indirect
/// object bodies (each body is the bytes between `N G obj` and `endobj`,
/// exclusive). Object numbers start at 1; object 0 is the free-list head.
pub fn build_pdf(objects: &[String], root_obj_num: u32) -> Vec<u8> {
    let header = b"%PDF-1.4\n".to_vec();
    let mut body = Vec::new();
    let mut offsets = vec![0usize]; // object 0 is the free entry

    for (i, obj_body) in objects.iter().enumerate() {
        let obj_num = i as u32 + 1;
        offsets.push(header.len() + body.len());
        body.extend_from_slice(format!("{} 0 obj\n", obj_num).as_bytes());
        body.extend_from_slice(obj_body.as_bytes());
        body.extend_from_slice(b"\nendobj\n");
    }

    let xref_pos = header.len() + body.len();
    let mut xref = format!("xref\n0 {}\n", objects.len() + 1);
    xref.push_str("0000000000 65535 f \n");
    for &off in &offsets[1..] {
        xref.push_str(&format!("{:010} 00000 n \n", off));
    }

    let trailer = format!(
        "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF",
        objects.len() + 1,
        root_obj_num,
        xref_pos
    );

    let mut out = header;
    out.extend_from_slice(&body);
    out.extend_from_slice(xref.as_bytes());
    out.extend_from_slice(trailer.as_bytes());
    out
}

/// A single-page PDF with a Helvetica font and a tiny content stream
/// drawing the given text.
pub fn single_page_pdf(text: &str) -> Vec<u8> {
    let stream_body = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", text);
    let objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", stream_body.len(), stream_body),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    build_pdf(&objects, 1)
}

/// A PDF whose page tree has `count` leaf pages, all siblings under one
/// Pages node, each with its own MediaBox.
pub fn multi_page_pdf(count: usize) -> Vec<u8> {
    let kids: Vec<String> = (0..count).map(|i| format!("{} 0 R", i + 3)).collect();
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            count
        ),
    ];
    for _ in 0..count {
        objects.push("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>".to_string());
    }
    build_pdf(&objects, 1)
}

/// A PDF with no pages at all.
pub fn empty_pages_pdf() -> Vec<u8> {
    let objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [] /Count 0 >>".to_string(),
    ];
    build_pdf(&objects, 1)
}
