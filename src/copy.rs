//! Copies objects from a parsed source document into a target under
//! construction, remapping indirect references as it goes.
//!
//! A [`CopyingContext`] owns a source→target id map built lazily as objects
//! are discovered: the first time a reference to source object N is copied,
//! a fresh target id is allocated and N is queued for emission later. This
//! mirrors [`crate::core::delta::DeltaLayer`]'s own "allocate now, emit
//! later" worklist but keys on a *pair* of documents rather than one.

use crate::core::decode;
use crate::core::delta::DeltaLayer;
use crate::core::error::{PDFError, PDFResult};
use crate::core::parser::{PDFObject, Ref};
use crate::core::{Page, PDFDocument};
use smallvec::SmallVec;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, PartialEq)]
enum State {
    Idle,
    Started,
    Stopped,
}

/// A byte-class tokenizer for rewriting resource names inside a content
/// stream. Unlike [`crate::core::lexer::Lexer`] it does not interpret
/// strings, comments, or numbers — it only needs to find `/Name` tokens and
/// their byte spans so the bytes around them can be copied verbatim.
pub struct SimpleTokenizer<'a> {
    data: &'a [u8],
    pos: usize,
}

/// A `/Name` token's location within the scanned buffer, name already
/// decoded (`#XX` escapes resolved) for matching against recorded remaps.
pub struct NameToken {
    pub start: usize,
    pub end: usize,
    pub name: String,
}

impl<'a> SimpleTokenizer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_whitespace(b: u8) -> bool {
        matches!(b, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
    }

    fn is_delimiter(b: u8) -> bool {
        matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
    }

    /// Advances to and returns the next `/Name` token, skipping everything
    /// else (numbers, operators, string/array/dict punctuation).
    pub fn next_name(&mut self) -> Option<NameToken> {
        while self.pos < self.data.len() {
            let b = self.data[self.pos];
            if b == b'/' {
                let start = self.pos;
                self.pos += 1;
                let name_start = self.pos;
                while self.pos < self.data.len()
                    && !Self::is_whitespace(self.data[self.pos])
                    && !Self::is_delimiter(self.data[self.pos])
                {
                    self.pos += 1;
                }
                let raw = &self.data[name_start..self.pos];
                return Some(NameToken {
                    start,
                    end: self.pos,
                    name: decode_name_escapes(raw),
                });
            }
            self.pos += 1;
        }
        None
    }
}

/// Decodes `#XX` hex escapes in a raw name's bytes, per ISO 32000-1 §7.3.5.
fn decode_name_escapes(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            let hex = std::str::from_utf8(&raw[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Encodes `name` the way it appears in written output, reusing the
/// writer's own escaping so remap matching agrees with emission.
fn encode_name(name: &str) -> String {
    let mut buf = Vec::new();
    crate::core::pdf_writer::PDFWriter::write_escaped_name(&mut buf, name)
        .expect("writing to a Vec<u8> cannot fail");
    String::from_utf8_lossy(&buf).into_owned()
}

const RESOURCE_CATEGORIES: [&str; 7] =
    ["Font", "XObject", "ExtGState", "ColorSpace", "Pattern", "Shading", "Properties"];

/// Drives copying and merging of pages/form-XObjects from one parsed
/// document into a target under construction. See the module docs for the
/// id-mapping strategy.
pub struct CopyingContext<'a> {
    source: &'a mut PDFDocument,
    state: State,
    id_map: HashMap<(u32, u16), Ref>,
    worklist: VecDeque<(u32, u16)>,
    target: DeltaLayer,
    next_resource_suffix: u32,
}

impl<'a> CopyingContext<'a> {
    /// Starts a copying session against `source`, with `target` already
    /// seeded at the destination document's current object count (so newly
    /// allocated ids never collide with ones already in the target).
    pub fn start(source: &'a mut PDFDocument, target: DeltaLayer) -> Self {
        Self {
            source,
            state: State::Started,
            id_map: HashMap::new(),
            worklist: VecDeque::new(),
            target,
            next_resource_suffix: 0,
        }
    }

    /// Ends the session, releasing the source→target mapping and handing
    /// back the accumulated target delta for serialization.
    pub fn stop(mut self) -> DeltaLayer {
        self.state = State::Stopped;
        self.id_map.clear();
        self.target
    }

    fn require_started(&self) -> PDFResult<()> {
        if self.state != State::Started {
            return Err(PDFError::copy_error("copying context is not in the Started state"));
        }
        Ok(())
    }

    /// Maps a source id to a target id, allocating and queuing it for
    /// deferred emission on first sight ("out-of-tree write").
    fn map_id(&mut self, source_id: (u32, u16)) -> Ref {
        if let Some(existing) = self.id_map.get(&source_id) {
            return *existing;
        }
        let target_ref = self.target.add_object(PDFObject::Null);
        self.id_map.insert(source_id, target_ref);
        self.worklist.push_back(source_id);
        target_ref
    }

    /// Deep-copies `obj`, remapping any `Ref` it (transitively) contains to
    /// a target id via [`Self::map_id`], queuing unseen source objects.
    fn remap_object(&mut self, obj: &PDFObject) -> PDFObject {
        match obj {
            PDFObject::Ref(r) => PDFObject::Ref(self.map_id(r.as_id())),
            PDFObject::Array(items) => {
                let mapped: SmallVec<[Box<PDFObject>; 4]> =
                    items.iter().map(|item| Box::new(self.remap_object(item))).collect();
                PDFObject::Array(mapped)
            }
            PDFObject::Dictionary(dict) => {
                let mapped = dict.iter().map(|(k, v)| (k.clone(), self.remap_object(v))).collect();
                PDFObject::Dictionary(mapped)
            }
            PDFObject::Stream { dict, data } => {
                let mapped_dict = dict.iter().map(|(k, v)| (k.clone(), self.remap_object(v))).collect();
                PDFObject::Stream {
                    dict: mapped_dict,
                    data: data.clone(),
                }
            }
            other => other.clone(),
        }
    }

    /// Fetches a source object by id, resolving it if it's an indirect
    /// reference itself (some `/Kids` entries and page dict values chain
    /// through more than one reference level before reaching real content).
    fn fetch_source(&mut self, id: (u32, u16)) -> PDFResult<PDFObject> {
        let obj = self.source.xref_mut().fetch(id.0, id.1)?;
        Ok((*obj).clone())
    }

    /// Copies one queued source object: resolves it, remaps its nested
    /// references, re-encodes its stream filter chain if present, and
    /// records it as a new object in the target at its already-allocated id.
    fn emit_one(&mut self, source_id: (u32, u16)) -> PDFResult<()> {
        let target_ref = self.id_map[&source_id];
        let source_obj = self.fetch_source(source_id)?;
        let copied = self.copy_stream_or_plain(&source_obj)?;
        // `add_object` already reserved this id with a `Null` placeholder;
        // overwrite it in place via `modify_object` so the final id matches
        // what callers already received.
        self.target.modify_object(target_ref, copied);
        Ok(())
    }

    /// Remaps references in `obj`, and for streams, decodes then re-encodes
    /// the filter chain through Flate (per spec: `/Length` is always
    /// recomputed, never copied).
    fn copy_stream_or_plain(&mut self, obj: &PDFObject) -> PDFResult<PDFObject> {
        match obj {
            PDFObject::Stream { dict, data } => {
                let filter = dict.get("Filter");
                let decode_parms = dict.get("DecodeParms");
                let decoded = decode::apply_filters(data, filter, decode_parms)
                    .map_err(|e| PDFError::copy_error(format!("failed to decode source stream for copy: {e}")))?;
                let encoded = decode::encode_flate(&decoded)?;

                let mut new_dict: HashMap<String, PDFObject> =
                    dict.iter().filter(|(k, _)| *k != "Length").map(|(k, v)| (k.clone(), self.remap_object(v))).collect();
                new_dict.insert("Filter".to_string(), PDFObject::Name("FlateDecode".to_string()));
                new_dict.remove("DecodeParms");
                new_dict.insert("Length".to_string(), PDFObject::Integer(encoded.len() as i64));

                Ok(PDFObject::Stream {
                    dict: new_dict,
                    data: encoded,
                })
            }
            other => Ok(self.remap_object(other)),
        }
    }

    /// Drains the worklist, emitting every source object transitively
    /// reachable from whatever's already been copied.
    fn drain_worklist(&mut self) -> PDFResult<()> {
        while let Some(source_id) = self.worklist.pop_front() {
            self.emit_one(source_id)?;
        }
        Ok(())
    }

    /// `CopyFormXObjectForPage`: materializes `source_page_index`'s content
    /// as a Form XObject in the target, with the given bounding box and
    /// placement matrix, returning the new object's target id.
    pub fn copy_form_xobject_for_page(
        &mut self,
        source_page_index: usize,
        bbox: [f64; 4],
        matrix: [f64; 6],
    ) -> PDFResult<Ref> {
        self.require_started()?;
        let page = self.source.get_page(source_page_index)?;
        let contents = page
            .contents()
            .cloned()
            .ok_or_else(|| PDFError::copy_error(format!("page {source_page_index} has no /Contents")))?;
        let resources = self
            .source
            .get_resources(&page)
            .map_err(|e| PDFError::copy_error(format!("page {source_page_index} has no resolvable /Resources: {e}")))?;

        let content_bytes = self.flatten_contents(&contents)?;

        let mapped_resources = self.remap_object(&resources);

        let bbox_arr: SmallVec<[Box<PDFObject>; 4]> =
            bbox.iter().map(|n| Box::new(PDFObject::Real(*n))).collect();
        let matrix_arr: SmallVec<[Box<PDFObject>; 4]> = matrix.iter().map(|n| Box::new(PDFObject::Real(*n))).collect();

        let mut dict: HashMap<String, PDFObject> = HashMap::new();
        dict.insert("Type".to_string(), PDFObject::Name("XObject".to_string()));
        dict.insert("Subtype".to_string(), PDFObject::Name("Form".to_string()));
        dict.insert("FormType".to_string(), PDFObject::Integer(1));
        dict.insert("BBox".to_string(), PDFObject::Array(bbox_arr));
        dict.insert("Matrix".to_string(), PDFObject::Array(matrix_arr));
        dict.insert("Resources".to_string(), mapped_resources);
        dict.insert("Length".to_string(), PDFObject::Integer(content_bytes.len() as i64));

        let xobject_ref = self.target.add_object(PDFObject::Null);
        self.target.modify_object(
            xobject_ref,
            PDFObject::Stream {
                dict,
                data: content_bytes,
            },
        );

        self.drain_worklist()?;
        Ok(xobject_ref)
    }

    /// `AppendPageAsNewPage`: copies `source_page_index` wholesale into the
    /// target as a brand-new, self-contained page object (not yet linked
    /// into any `/Pages` tree — linking the returned id into the target's
    /// page tree is the caller's responsibility, since only the caller
    /// knows the target tree's shape).
    pub fn append_page_as_new_page(&mut self, source_page_index: usize) -> PDFResult<Ref> {
        self.require_started()?;
        let page = self.source.get_page(source_page_index)?;
        let page_dict = page.dict().clone();
        let mut dict = match page_dict {
            PDFObject::Dictionary(d) => d,
            other => {
                return Err(PDFError::InvalidObject {
                    expected: "Dictionary".into(),
                    found: format!("{other:?}"),
                });
            }
        };

        // Materialize inherited attributes so the copied page stands alone
        // without a dangling pointer into the source's page tree.
        let media_box = self.source.get_media_box(&page)?;
        let resources = self.source.get_resources(&page)?;
        dict.insert("MediaBox".to_string(), media_box);
        dict.insert("Resources".to_string(), resources);
        dict.remove("Parent");

        let remapped = self.remap_object(&PDFObject::Dictionary(dict));
        let page_ref = self.target.add_object(PDFObject::Null);
        self.target.modify_object(page_ref, remapped);

        self.drain_worklist()?;
        Ok(page_ref)
    }

    /// `MergePageContentToTargetPage`: appends `source_page_index`'s content
    /// stream to `target_page`'s own content, remapping any resource-name
    /// collisions along the way (step 1–3 of the resource-remap algorithm).
    ///
    /// Writes the merged page dictionary into the target delta keyed by
    /// `target_page`'s own indirect reference; it does not mutate the
    /// in-memory `Page` handed in, so callers re-reading `target_page` after
    /// a merge still see the pre-merge dictionary — re-fetch the page from
    /// the target document if a second merge onto the same page is needed.
    pub fn merge_page_content_to_target_page(
        &mut self,
        target_page: &Page,
        source_page_index: usize,
    ) -> PDFResult<()> {
        self.require_started()?;
        let source_page = self.source.get_page(source_page_index)?;
        let source_resources = self
            .source
            .get_resources(&source_page)
            .map_err(|e| PDFError::copy_error(format!("source page has no resolvable /Resources: {e}")))?;
        let source_contents = source_page
            .contents()
            .cloned()
            .ok_or_else(|| PDFError::copy_error("source page has no /Contents".to_string()))?;
        let source_bytes = self.flatten_contents(&source_contents)?;

        let target_dict = match target_page.dict() {
            PDFObject::Dictionary(d) => d.clone(),
            other => {
                return Err(PDFError::InvalidObject {
                    expected: "Dictionary".into(),
                    found: format!("{other:?}"),
                });
            }
        };
        // `/Resources` is commonly an indirect reference (and may be
        // inherited from a `/Pages` ancestor), so it can't just be read off
        // `target_dict` the way an already-inline value could be.
        let target_resources_obj = self
            .source
            .get_resources(target_page)
            .map_err(|e| PDFError::copy_error(format!("target page has no resolvable /Resources: {e}")))?;
        let mut target_resources = match target_resources_obj {
            PDFObject::Dictionary(d) => d,
            _ => HashMap::new(),
        };

        let mut renames: HashMap<String, String> = HashMap::new();
        if let Some(source_res_dict) = source_resources.as_dictionary() {
            for category in RESOURCE_CATEGORIES {
                let Some(entries) = source_res_dict.get(category).and_then(PDFObject::as_dictionary) else {
                    continue;
                };
                let mut target_category = match target_resources.get(category) {
                    Some(PDFObject::Dictionary(d)) => d.clone(),
                    _ => HashMap::new(),
                };
                for (old_name, value) in entries {
                    let new_ref = self.remap_object(value);
                    let new_name = if target_category.contains_key(old_name) {
                        self.next_resource_suffix += 1;
                        format!("{old_name}Cpy{}", self.next_resource_suffix)
                    } else {
                        old_name.clone()
                    };
                    renames.insert(old_name.clone(), new_name.clone());
                    target_category.insert(new_name, new_ref);
                }
                target_resources.insert(category.to_string(), PDFObject::Dictionary(target_category));
            }
        }

        self.drain_worklist()?;

        let rewritten = rewrite_resource_names(&source_bytes, &renames);

        let mut merged = match target_dict.get("Contents") {
            Some(existing) => self.flatten_contents(existing)?,
            None => Vec::new(),
        };
        if !merged.is_empty() {
            merged.push(b'\n');
        }
        merged.extend_from_slice(&rewritten);

        let contents_ref = self.target.add_object(PDFObject::Stream {
            dict: {
                let mut d = HashMap::new();
                d.insert("Length".to_string(), PDFObject::Integer(merged.len() as i64));
                d
            },
            data: merged,
        });

        let mut new_target_dict = target_dict;
        new_target_dict.insert("Resources".to_string(), PDFObject::Dictionary(target_resources));
        new_target_dict.insert("Contents".to_string(), PDFObject::Ref(contents_ref));

        if let Some((num, generation)) = target_page.reference() {
            self.target
                .modify_object(Ref::new(num, generation), PDFObject::Dictionary(new_target_dict));
        }

        Ok(())
    }

    /// Resolves a `/Contents` entry (a single stream or an array of
    /// streams, concatenated with an inserted newline between each) to its
    /// raw decoded bytes.
    fn flatten_contents(&mut self, contents: &PDFObject) -> PDFResult<Vec<u8>> {
        let resolved = self.source.xref_mut().fetch_if_ref(contents)?;
        match &resolved {
            PDFObject::Stream { dict, data } => {
                decode::apply_filters(data, dict.get("Filter"), dict.get("DecodeParms"))
            }
            PDFObject::Array(items) => {
                let mut out = Vec::new();
                for item in items.iter() {
                    if !out.is_empty() {
                        out.push(b'\n');
                    }
                    let resolved_item = self.source.xref_mut().fetch_if_ref(item)?;
                    if let PDFObject::Stream { dict, data } = &resolved_item {
                        out.extend(decode::apply_filters(data, dict.get("Filter"), dict.get("DecodeParms"))?);
                    }
                }
                Ok(out)
            }
            other => Err(PDFError::InvalidObject {
                expected: "Stream or Array of Streams".into(),
                found: format!("{other:?}"),
            }),
        }
    }
}

/// Scans `content` with [`SimpleTokenizer`] and substitutes any `/name`
/// token found in `renames`, copying everything else byte-for-byte.
fn rewrite_resource_names(content: &[u8], renames: &HashMap<String, String>) -> Vec<u8> {
    if renames.is_empty() {
        return content.to_vec();
    }
    let mut out = Vec::with_capacity(content.len());
    let mut cursor = 0;
    let mut tokenizer = SimpleTokenizer::new(content);
    while let Some(token) = tokenizer.next_name() {
        out.extend_from_slice(&content[cursor..token.start]);
        match renames.get(&token.name) {
            Some(new_name) => {
                out.push(b'/');
                out.extend_from_slice(encode_name(new_name).as_bytes());
            }
            None => out.extend_from_slice(&content[token.start..token.end]),
        }
        cursor = token.end;
    }
    out.extend_from_slice(&content[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_tokenizer_finds_name_tokens_and_skips_other_bytes() {
        let content = b"q 1 0 0 1 0 0 cm /F1 12 Tf /Im0 Do Q";
        let mut tok = SimpleTokenizer::new(content);
        let names: Vec<String> = std::iter::from_fn(|| tok.next_name()).map(|t| t.name).collect();
        assert_eq!(names, vec!["F1".to_string(), "Im0".to_string()]);
    }

    #[test]
    fn decode_name_escapes_resolves_hex_pairs() {
        assert_eq!(decode_name_escapes(b"A#20B"), "A B");
        assert_eq!(decode_name_escapes(b"Plain"), "Plain");
    }

    #[test]
    fn rewrite_resource_names_substitutes_marked_tokens_only() {
        let content = b"/F1 12 Tf /Im0 Do";
        let mut renames = HashMap::new();
        renames.insert("F1".to_string(), "F1Cpy1".to_string());
        let rewritten = rewrite_resource_names(content, &renames);
        assert_eq!(String::from_utf8(rewritten).unwrap(), "/F1Cpy1 12 Tf /Im0 Do");
    }

    #[test]
    fn rewrite_resource_names_is_noop_with_no_collisions() {
        let content = b"/F1 12 Tf";
        assert_eq!(rewrite_resource_names(content, &HashMap::new()), content.to_vec());
    }

    /// Two-page source document, each page with its own `/F1` font under a
    /// distinct indirect object — the F1-name collision that
    /// `merge_page_content_to_target_page` has to resolve by renaming.
    fn two_page_pdf_with_resources() -> Vec<u8> {
        let header = b"%PDF-1.4\n".to_vec();
        let page0_content = "BT /F1 12 Tf (Hi) Tj ET";
        let page1_content = "BT /F1 10 Tf (Bye) Tj ET";

        let objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R 6 0 R] /Count 2 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources 4 0 R /Contents 5 0 R >>".to_string(),
            "<< /Font << /F1 7 0 R >> >>".to_string(),
            format!("<< /Length {} >>\nstream\n{page0_content}\nendstream", page0_content.len()),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources 8 0 R /Contents 9 0 R >>".to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
            "<< /Font << /F1 10 0 R >> >>".to_string(),
            format!("<< /Length {} >>\nstream\n{page1_content}\nendstream", page1_content.len()),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Times-Roman >>".to_string(),
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
    fn append_page_as_new_page_round_trips_into_a_fresh_document() {
        let source_bytes = two_page_pdf_with_resources();
        let mut source = PDFDocument::open(source_bytes).unwrap();

        let target = DeltaLayer::new(1);
        let mut ctx = CopyingContext::start(&mut source, target);
        let new_page_ref = ctx.append_page_as_new_page(0).unwrap();
        let mut delta = ctx.stop();

        let pages_ref = delta.add_object(PDFObject::Null);
        let kids: SmallVec<[Box<PDFObject>; 4]> = smallvec::smallvec![Box::new(PDFObject::Ref(new_page_ref))];
        let mut pages_dict = HashMap::new();
        pages_dict.insert("Type".to_string(), PDFObject::Name("Pages".to_string()));
        pages_dict.insert("Kids".to_string(), PDFObject::Array(kids));
        pages_dict.insert("Count".to_string(), PDFObject::Integer(1));
        delta.modify_object(pages_ref, PDFObject::Dictionary(pages_dict));

        let mut page_dict = match delta.get(&new_page_ref).unwrap().object.clone() {
            PDFObject::Dictionary(d) => d,
            other => panic!("expected dictionary, got {other:?}"),
        };
        page_dict.insert("Parent".to_string(), PDFObject::Ref(pages_ref));
        delta.modify_object(new_page_ref, PDFObject::Dictionary(page_dict));

        let catalog_ref = delta.add_object(PDFObject::Null);
        let mut catalog_dict = HashMap::new();
        catalog_dict.insert("Type".to_string(), PDFObject::Name("Catalog".to_string()));
        catalog_dict.insert("Pages".to_string(), PDFObject::Ref(pages_ref));
        delta.modify_object(catalog_ref, PDFObject::Dictionary(catalog_dict));

        let root = PDFObject::Ref(catalog_ref);
        let bytes = crate::core::pdf_writer::PDFWriter::write_new_document(&delta, "1.7", &root).unwrap();

        let mut reopened = PDFDocument::open(bytes).unwrap();
        assert_eq!(reopened.page_count().unwrap(), 1);
        let page = reopened.get_page(0).unwrap();
        let contents = page.contents().cloned().unwrap();
        let resolved = reopened.xref_mut().fetch_if_ref(&contents).unwrap();
        let data = match resolved {
            PDFObject::Stream { dict, data } => decode::apply_filters(&data, dict.get("Filter"), dict.get("DecodeParms")).unwrap(),
            other => panic!("expected a stream, got {other:?}"),
        };
        assert_eq!(String::from_utf8(data).unwrap(), "BT /F1 12 Tf (Hi) Tj ET");
    }

    #[test]
    fn copy_form_xobject_for_page_materializes_a_form_stream() {
        let source_bytes = two_page_pdf_with_resources();
        let mut source = PDFDocument::open(source_bytes).unwrap();

        let target = DeltaLayer::new(1);
        let mut ctx = CopyingContext::start(&mut source, target);
        let xobject_ref = ctx.copy_form_xobject_for_page(0, [0.0, 0.0, 612.0, 792.0], [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
        let delta = ctx.stop();

        let obj = &delta.get(&xobject_ref).unwrap().object;
        match obj {
            PDFObject::Stream { dict, data } => {
                assert_eq!(dict.get("Subtype"), Some(&PDFObject::Name("Form".to_string())));
                match dict.get("BBox") {
                    Some(PDFObject::Array(bbox)) => assert_eq!(bbox.len(), 4),
                    other => panic!("expected BBox array, got {other:?}"),
                }
                let decoded = decode::apply_filters(data, dict.get("Filter"), dict.get("DecodeParms")).unwrap();
                assert_eq!(String::from_utf8(decoded).unwrap(), "BT /F1 12 Tf (Hi) Tj ET");
            }
            other => panic!("expected a stream, got {other:?}"),
        }
    }

    #[test]
    fn merge_page_content_to_target_page_renames_colliding_font_resource() {
        let source_bytes = two_page_pdf_with_resources();
        let mut source = PDFDocument::open(source_bytes).unwrap();
        let target_page = source.get_page(0).unwrap();
        let target_ref = target_page.reference().unwrap();

        let target = DeltaLayer::new(20);
        let mut ctx = CopyingContext::start(&mut source, target);
        ctx.merge_page_content_to_target_page(&target_page, 1).unwrap();
        let delta = ctx.stop();

        let merged = &delta.get(&Ref::new(target_ref.0, target_ref.1)).unwrap().object;
        let dict = match merged {
            PDFObject::Dictionary(d) => d,
            other => panic!("expected dictionary, got {other:?}"),
        };

        let resources = match dict.get("Resources") {
            Some(PDFObject::Dictionary(d)) => d,
            other => panic!("expected Resources dictionary, got {other:?}"),
        };
        let fonts = match resources.get("Font") {
            Some(PDFObject::Dictionary(d)) => d,
            other => panic!("expected Font dictionary, got {other:?}"),
        };
        assert!(fonts.contains_key("F1"));
        assert!(fonts.contains_key("F1Cpy1"));

        let contents_ref = match dict.get("Contents") {
            Some(PDFObject::Ref(r)) => *r,
            other => panic!("expected a Ref, got {other:?}"),
        };
        let merged_stream = &delta.get(&contents_ref).unwrap().object;
        let text = match merged_stream {
            PDFObject::Stream { data, .. } => String::from_utf8(data.clone()).unwrap(),
            other => panic!("expected a stream, got {other:?}"),
        };
        assert!(text.contains("/F1 12 Tf (Hi) Tj ET"));
        assert!(text.contains("/F1Cpy1 10 Tf (Bye) Tj ET"));
    }
}
