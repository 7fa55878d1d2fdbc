//! Drives a single incremental-update edit against an already-opened document:
//! build a [`DeltaLayer`], execute a [`Command`] against it, and serialize the
//! result as bytes appendable to the source file.

use crate::core::delta::{AppendPageCommand, Command, DeltaLayer, ReplaceContentsCommand};
use crate::core::error::{PDFError, PDFResult};
use crate::core::parser::Ref;
use crate::core::pdf_writer::PDFWriter;
use crate::core::PDFDocument;
use std::cell::RefCell;

/// Applies `command` to `doc` and returns the full output file: the original
/// bytes followed by a new incremental-update section.
///
/// `original_bytes` must be the exact bytes `doc` was opened from — the
/// output's first `original_bytes.len()` bytes are an unmodified copy of it,
/// per the incremental-update invariant that the prior file is preserved as
/// a byte-suffix of the new one.
pub fn apply_command(
    doc: &mut PDFDocument,
    original_bytes: &[u8],
    mut command: Box<dyn Command>,
) -> PDFResult<Vec<u8>> {
    let base_size = doc.xref().len() as u32;
    let mut delta = DeltaLayer::new(base_size);

    {
        // `Command::execute` takes a `Fn` fetcher (callable without unique
        // access), but resolving a reference still needs `XRef::fetch`'s
        // `&mut self` for its object cache — route it through a `RefCell`
        // so the shared-by-signature closure can still get exclusive access
        // at call time.
        let xref = RefCell::new(doc.xref_mut());
        let fetch = |r: Ref| -> PDFResult<crate::core::PDFObject> {
            let mut guard = xref.borrow_mut();
            xref_fetch(&mut **guard, r)
        };
        command.execute(&mut delta, Some(&fetch))?;
    }

    let prev_xref_offset = find_prev_startxref(original_bytes)?;
    let total_object_count = base_size.max(delta.next_obj_num());
    let root = doc
        .xref()
        .trailer()
        .and_then(|t| t.as_dictionary())
        .and_then(|d| d.get("Root"))
        .cloned()
        .ok_or_else(|| PDFError::Generic("source trailer has no /Root entry".into()))?;

    let update = PDFWriter::write_incremental_update(
        &delta,
        original_bytes.len(),
        total_object_count,
        prev_xref_offset,
        &root,
    )?;

    let mut out = Vec::with_capacity(original_bytes.len() + update.len());
    out.extend_from_slice(original_bytes);
    out.extend_from_slice(&update);
    Ok(out)
}

/// Builds a [`crate::core::delta::RotatePageCommand`] for `page_index` and applies it.
pub fn rotate_page(
    doc: &mut PDFDocument,
    original_bytes: &[u8],
    page_index: usize,
    degrees: i64,
) -> PDFResult<Vec<u8>> {
    let page = doc.get_page(page_index)?;
    let page_ref = page.reference().ok_or_else(|| {
        PDFError::PageError {
            message: format!("page {page_index} has no indirect object reference to rotate"),
        }
    })?;
    let command = Box::new(crate::core::delta::RotatePageCommand::new(
        Ref::new(page_ref.0, page_ref.1),
        degrees,
    ));
    apply_command(doc, original_bytes, command)
}

/// Builds an [`AppendPageCommand`] targeting the document's `/Pages` node
/// and applies it — spec's `AppendPage(page)` mutation kind.
pub fn append_page(
    doc: &mut PDFDocument,
    original_bytes: &[u8],
    media_box: [f64; 4],
    contents: Vec<u8>,
) -> PDFResult<Vec<u8>> {
    let pages_ref = doc.pages_ref()?;
    let command = Box::new(AppendPageCommand::new(pages_ref, media_box, contents));
    apply_command(doc, original_bytes, command)
}

/// Builds a [`ReplaceContentsCommand`] for `page_index` and applies it —
/// spec's `ModifyPage(index)` mutation kind.
pub fn replace_contents(
    doc: &mut PDFDocument,
    original_bytes: &[u8],
    page_index: usize,
    new_contents: Vec<u8>,
) -> PDFResult<Vec<u8>> {
    let page = doc.get_page(page_index)?;
    let page_ref = page.reference().ok_or_else(|| PDFError::PageError {
        message: format!("page {page_index} has no indirect object reference to replace contents on"),
    })?;
    let command = Box::new(ReplaceContentsCommand::new(Ref::new(page_ref.0, page_ref.1), new_contents));
    apply_command(doc, original_bytes, command)
}

fn xref_fetch(xref: &mut crate::core::XRef, r: Ref) -> PDFResult<crate::core::PDFObject> {
    xref.fetch(r.num, r.generation).map(|rc| (*rc).clone())
}

/// Finds the `startxref` offset in the original file's trailing footer, so
/// the new trailer's `/Prev` chains back to it.
fn find_prev_startxref(data: &[u8]) -> PDFResult<usize> {
    const MAX_SCAN: usize = 2048;
    let start = data.len().saturating_sub(MAX_SCAN);
    let tail = &data[start..];

    let marker = b"startxref";
    let pos = tail
        .windows(marker.len())
        .rposition(|w| w == marker)
        .ok_or_else(|| PDFError::XRefError {
            message: "no startxref marker found in source file".into(),
        })?;

    let after = &tail[pos + marker.len()..];
    let digits: String = after
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .map(|&b| b as char)
        .collect();

    digits
        .parse::<usize>()
        .map_err(|_| PDFError::XRefError {
            message: "malformed startxref offset in source file".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PDFDocument, PDFObject};

    fn single_page_pdf() -> Vec<u8> {
        let header = b"%PDF-1.4\n".to_vec();
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>",
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>",
        ];
        let mut body = Vec::new();
        let mut offsets = vec![0usize];
        for (i, obj) in objects.iter().enumerate() {
            offsets.push(header.len() + body.len());
            body.extend_from_slice(format!("{} 0 obj\n{obj}\nendobj\n", i + 1).as_bytes());
        }
        let xref_pos = header.len() + body.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for off in &offsets[1..] {
            xref.push_str(&format!("{off:010} 00000 n \n"));
        }
        let trailer = format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_pos}\n%%EOF",
            objects.len() + 1
        );
        let mut out = header;
        out.extend_from_slice(&body);
        out.extend_from_slice(xref.as_bytes());
        out.extend_from_slice(trailer.as_bytes());
        out
    }

    #[test]
    fn rotate_page_appends_incremental_update_preserving_prefix() {
        let original = single_page_pdf();
        let mut doc = PDFDocument::open(original.clone()).unwrap();

        let output = rotate_page(&mut doc, &original, 0, 90).unwrap();

        assert!(output.len() > original.len());
        assert_eq!(&output[..original.len()], &original[..]);
        assert!(output.ends_with(b"%%EOF"));

        let mut reopened = PDFDocument::open(output).unwrap();
        let page = reopened.get_page(0).unwrap();
        assert_eq!(reopened.get_rotate(&page), 90);
    }

    #[test]
    fn append_page_extends_page_count_via_incremental_update() {
        let original = single_page_pdf();
        let mut doc = PDFDocument::open(original.clone()).unwrap();
        assert_eq!(doc.page_count().unwrap(), 1);

        let output = append_page(&mut doc, &original, [0.0, 0.0, 612.0, 792.0], b"q Q".to_vec()).unwrap();
        assert!(output.ends_with(b"%%EOF"));
        assert_eq!(&output[..original.len()], &original[..]);

        let mut reopened = PDFDocument::open(output).unwrap();
        assert_eq!(reopened.page_count().unwrap(), 2);
    }

    #[test]
    fn replace_contents_points_page_at_a_new_content_stream() {
        let original = single_page_pdf();
        let mut doc = PDFDocument::open(original.clone()).unwrap();
        let original_contents_ref = match doc.get_page(0).unwrap().contents() {
            Some(PDFObject::Ref(r)) => *r,
            other => panic!("expected a Ref, got {other:?}"),
        };

        let output = replace_contents(&mut doc, &original, 0, b"1 0 0 1 0 0 cm".to_vec()).unwrap();
        assert!(output.ends_with(b"%%EOF"));

        let mut reopened = PDFDocument::open(output).unwrap();
        let page = reopened.get_page(0).unwrap();
        match page.contents() {
            Some(PDFObject::Ref(r)) => assert_ne!(*r, original_contents_ref),
            other => panic!("expected a Ref, got {other:?}"),
        }
    }

    #[test]
    fn find_prev_startxref_reads_trailing_offset() {
        let data = single_page_pdf();
        let offset = find_prev_startxref(&data).unwrap();
        let expected_tail = format!("startxref\n{offset}\n%%EOF");
        assert!(String::from_utf8_lossy(&data).ends_with(&expected_tail));
    }
}
