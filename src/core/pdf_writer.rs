//! Two writer surfaces share this module:
//!
//! - [`PDFWriter::write_incremental_update`] and [`PDFWriter::write_new_document`]:
//!   stateless associated functions that serialize an already-accumulated
//!   [`DeltaLayer`] in one pass — the former appended after an existing
//!   file's bytes (ISO 32000-1 §7.5.6), the latter as a complete,
//!   standalone file with no prior bytes to extend.
//! - A stateful [`PDFWriter`] *instance*, built with [`PDFWriter::new`],
//!   for hand-assembling a document object by object:
//!
//! ```text
//! [%PDF-x.y header]
//! [objects, each opened/closed via start_new_indirect_object/end_indirect_object]
//! [xref table or xref stream]
//! [trailer, %%EOF]
//! ```

use super::decode;
use super::delta::DeltaLayer;
use super::error::{PDFError, PDFResult};
use super::parser::{PDFObject, Ref};
use smallvec::{smallvec, SmallVec};
use std::collections::HashMap;
use std::io::Write;

pub struct PDFWriter {
    buffer: Vec<u8>,
    next_obj_num: u32,
    object_offsets: HashMap<(u32, u16), u64>,
    compress_streams: bool,
    root: Option<Ref>,
    info: Option<Ref>,
    current_object: Option<Ref>,
}

/// Accumulates `/Key value` pairs for a dictionary before it's written in
/// one pass via [`PDFWriter::end_dictionary`] or as a stream's dictionary
/// via [`PDFWriter::start_pdf_stream`]. Returned by [`PDFWriter::start_dictionary`].
#[derive(Debug, Default)]
pub struct DictionaryContext {
    entries: Vec<(String, PDFObject)>,
}

impl DictionaryContext {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Records `key: value`, replacing any earlier entry for the same key.
    pub fn write_key(mut self, key: &str, value: PDFObject) -> Self {
        self.entries.retain(|(k, _)| k != key);
        self.entries.push((key.to_string(), value));
        self
    }
}

impl PDFWriter {
    /// Starts building a brand-new PDF from scratch at the given version
    /// (e.g. `"1.3"`), with no prior file bytes to extend. Streams are
    /// Flate-compressed by default; see [`Self::set_compress_streams`].
    pub fn new(version: &str) -> Self {
        let mut buffer = Vec::new();
        let _ = write!(buffer, "%PDF-{version}\n");
        buffer.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        Self {
            buffer,
            next_obj_num: 1,
            object_offsets: HashMap::new(),
            compress_streams: true,
            root: None,
            info: None,
            current_object: None,
        }
    }

    /// Whether [`Self::start_pdf_stream`] re-encodes stream bodies through
    /// Flate, as opposed to writing them verbatim like
    /// [`Self::start_unfiltered_pdf_stream`] always does.
    pub fn is_compressing_streams(&self) -> bool {
        self.compress_streams
    }

    pub fn set_compress_streams(&mut self, compress: bool) {
        self.compress_streams = compress;
    }

    /// Records the catalog's object id as the trailer's `/Root`. Required
    /// before [`Self::end_pdf`] or [`Self::end_pdf_with_xref_stream`].
    pub fn set_root(&mut self, root: Ref) {
        self.root = Some(root);
    }

    pub fn set_info(&mut self, info: Ref) {
        self.info = Some(info);
    }

    /// Reserves the next object number, records its byte offset, and
    /// writes its `N G obj` header. Must be paired with exactly one
    /// [`Self::end_indirect_object`] before another object can be started.
    pub fn start_new_indirect_object(&mut self) -> PDFResult<Ref> {
        if self.current_object.is_some() {
            return Err(PDFError::Generic("an indirect object is already open".into()));
        }
        let obj_ref = Ref::new(self.next_obj_num, 0);
        self.next_obj_num += 1;
        self.object_offsets.insert(obj_ref.as_id(), self.buffer.len() as u64);
        write!(self.buffer, "{} {} obj\n", obj_ref.num, obj_ref.generation)
            .map_err(|e| PDFError::Generic(format!("failed to write object header: {e}")))?;
        self.current_object = Some(obj_ref);
        Ok(obj_ref)
    }

    /// Closes the object opened by [`Self::start_new_indirect_object`].
    pub fn end_indirect_object(&mut self) -> PDFResult<()> {
        if self.current_object.take().is_none() {
            return Err(PDFError::Generic("no indirect object is open".into()));
        }
        self.buffer.extend_from_slice(b"\nendobj\n");
        Ok(())
    }

    /// Begins a dictionary body: the returned context accumulates entries
    /// that [`Self::end_dictionary`] later writes as `<< ... >>` in one pass.
    pub fn start_dictionary(&self) -> DictionaryContext {
        DictionaryContext::new()
    }

    /// Writes `ctx`'s accumulated entries as `<< ... >>`.
    pub fn end_dictionary(&mut self, ctx: DictionaryContext) -> PDFResult<()> {
        self.write_dict_entries(&ctx.entries)
    }

    fn write_dict_entries(&mut self, entries: &[(String, PDFObject)]) -> PDFResult<()> {
        self.buffer
            .write_all(b"<<")
            .map_err(|e| PDFError::Generic(format!("failed to write dict prefix: {e}")))?;
        for (key, value) in entries {
            self.buffer
                .write_all(b"/")
                .map_err(|e| PDFError::Generic(format!("failed to write key prefix: {e}")))?;
            Self::write_escaped_name(&mut self.buffer, key)
                .map_err(|e| PDFError::Generic(format!("failed to write key: {e}")))?;
            self.buffer
                .write_all(b" ")
                .map_err(|e| PDFError::Generic(format!("failed to write separator: {e}")))?;
            Self::write_object(&mut self.buffer, value)?;
            self.buffer
                .write_all(b" ")
                .map_err(|e| PDFError::Generic(format!("failed to write separator: {e}")))?;
        }
        self.buffer
            .write_all(b">>")
            .map_err(|e| PDFError::Generic(format!("failed to write dict suffix: {e}")))
    }

    /// Writes `ctx` followed by a stream body holding `data`, Flate-encoded
    /// when [`Self::is_compressing_streams`] is set. `/Length` and
    /// `/Filter` are always recomputed; any entries `ctx` already has for
    /// those keys are discarded.
    pub fn start_pdf_stream(&mut self, ctx: DictionaryContext, data: &[u8]) -> PDFResult<()> {
        if self.compress_streams {
            let encoded = decode::encode_flate(data)?;
            self.write_stream_with_dict(ctx, &encoded, Some("FlateDecode"))
        } else {
            self.write_stream_with_dict(ctx, data, None)
        }
    }

    /// Writes `ctx` and `data` as a stream verbatim, with no filter applied
    /// regardless of [`Self::is_compressing_streams`] — for bytes that are
    /// already encoded, or that the caller has decided not to filter.
    pub fn start_unfiltered_pdf_stream(&mut self, ctx: DictionaryContext, data: &[u8]) -> PDFResult<()> {
        self.write_stream_with_dict(ctx, data, None)
    }

    fn write_stream_with_dict(&mut self, ctx: DictionaryContext, data: &[u8], filter: Option<&str>) -> PDFResult<()> {
        let mut entries: Vec<(String, PDFObject)> =
            ctx.entries.into_iter().filter(|(k, _)| k != "Length" && k != "Filter").collect();
        if let Some(name) = filter {
            entries.push(("Filter".to_string(), PDFObject::Name(name.to_string())));
        }
        entries.push(("Length".to_string(), PDFObject::Integer(data.len() as i64)));
        self.write_dict_entries(&entries)?;
        self.buffer
            .write_all(b"\nstream\n")
            .map_err(|e| PDFError::Generic(format!("failed to write stream keyword: {e}")))?;
        self.buffer
            .write_all(data)
            .map_err(|e| PDFError::Generic(format!("failed to write stream data: {e}")))?;
        self.buffer
            .write_all(b"\nendstream")
            .map_err(|e| PDFError::Generic(format!("failed to write endstream keyword: {e}")))
    }

    /// Writes the final classic xref table, trailer, and `%%EOF`, consuming
    /// the writer. [`Self::set_root`] must have been called first.
    pub fn end_pdf(mut self) -> PDFResult<Vec<u8>> {
        if self.current_object.is_some() {
            return Err(PDFError::Generic("cannot end PDF with an indirect object still open".into()));
        }
        let root = self.root.ok_or_else(|| PDFError::Generic("cannot end PDF without a /Root".into()))?;

        let xref_start_offset = self.buffer.len() as u64;
        Self::write_full_xref_table(&mut self.buffer, self.next_obj_num, &self.object_offsets)?;

        write!(self.buffer, "trailer\n<< /Size {} /Root {} {} R", self.next_obj_num, root.num, root.generation)
            .map_err(|e| PDFError::Generic(format!("failed to write trailer: {e}")))?;
        if let Some(info) = self.info {
            write!(self.buffer, " /Info {} {} R", info.num, info.generation)
                .map_err(|e| PDFError::Generic(format!("failed to write trailer: {e}")))?;
        }
        write!(self.buffer, " >>\nstartxref\n{xref_start_offset}\n")
            .map_err(|e| PDFError::Generic(format!("failed to write trailer: {e}")))?;
        self.buffer.extend_from_slice(b"%%EOF");
        Ok(self.buffer)
    }

    /// Writes the final xref *stream* (ISO 32000-1 §7.5.8) instead of a
    /// classic table, trailer fields folded into the stream dictionary
    /// itself, and `%%EOF`. For documents targeting version >= 1.5.
    pub fn end_pdf_with_xref_stream(mut self) -> PDFResult<Vec<u8>> {
        if self.current_object.is_some() {
            return Err(PDFError::Generic("cannot end PDF with an indirect object still open".into()));
        }
        let root = self.root.ok_or_else(|| PDFError::Generic("cannot end PDF without a /Root".into()))?;

        let xref_obj_num = self.next_obj_num;
        let xref_offset = self.buffer.len() as u64;
        self.object_offsets.insert((xref_obj_num, 0), xref_offset);

        let (entries_data, offset_width) = Self::write_xref_stream(xref_obj_num + 1, &self.object_offsets)?;

        let w_array: SmallVec<[Box<PDFObject>; 4]> = smallvec![
            Box::new(PDFObject::Integer(1)),
            Box::new(PDFObject::Integer(offset_width as i64)),
            Box::new(PDFObject::Integer(2)),
        ];
        let mut ctx = DictionaryContext::new()
            .write_key("Type", PDFObject::Name("XRef".to_string()))
            .write_key("Size", PDFObject::Integer((xref_obj_num + 1) as i64))
            .write_key("Root", PDFObject::Ref(root))
            .write_key("W", PDFObject::Array(w_array));
        if let Some(info) = self.info {
            ctx = ctx.write_key("Info", PDFObject::Ref(info));
        }

        write!(self.buffer, "{xref_obj_num} 0 obj\n")
            .map_err(|e| PDFError::Generic(format!("failed to write object header: {e}")))?;
        self.write_stream_with_dict(ctx, &entries_data, None)?;
        self.buffer.extend_from_slice(b"\nendobj\n");

        write!(self.buffer, "startxref\n{xref_offset}\n")
            .map_err(|e| PDFError::Generic(format!("failed to write trailer: {e}")))?;
        self.buffer.extend_from_slice(b"%%EOF");
        Ok(self.buffer)
    }

    /// Builds the bytes to append after `original_size` bytes of the source
    /// file. `total_object_count` becomes the new trailer's `/Size`;
    /// `prev_xref_offset` becomes its `/Prev`.
    pub fn write_incremental_update(
        delta: &DeltaLayer,
        original_size: usize,
        total_object_count: u32,
        prev_xref_offset: usize,
        root: &PDFObject,
    ) -> PDFResult<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut object_offsets: HashMap<(u32, u16), u64> = HashMap::new();

        let objects_to_write = Self::collect_objects_to_write(delta);
        for (obj_id, delta_obj) in &objects_to_write {
            let offset = original_size as u64 + buffer.len() as u64;
            object_offsets.insert(*obj_id, offset);

            write!(buffer, "{} {} obj\n", obj_id.0, obj_id.1)
                .map_err(|e| PDFError::Generic(format!("failed to write object header: {e}")))?;
            Self::write_object(&mut buffer, &delta_obj.object)?;
            buffer.extend_from_slice(b"\nendobj\n");
        }

        let xref_start_offset = original_size as u64 + buffer.len() as u64;
        Self::write_xref_table(&mut buffer, &object_offsets)?;
        Self::write_trailer(&mut buffer, xref_start_offset, total_object_count, prev_xref_offset, root)?;
        buffer.extend_from_slice(b"%%EOF");

        Ok(buffer)
    }

    /// Serializes a from-scratch [`DeltaLayer`] (seeded with
    /// `DeltaLayer::new(1)`, reserving id 0 for the free-list head) as a
    /// complete, standalone PDF: header, every accumulated object, a full
    /// classic xref table (including the mandatory free entry for object
    /// 0), trailer, and `%%EOF`. Used by bulk document construction
    /// (`src/copy.rs`) which accumulates its output the same way
    /// incremental edits do, but has no prior file to extend.
    pub fn write_new_document(delta: &DeltaLayer, version: &str, root: &PDFObject) -> PDFResult<Vec<u8>> {
        let mut buffer = Vec::new();
        write!(buffer, "%PDF-{version}\n").map_err(|e| PDFError::Generic(format!("failed to write header: {e}")))?;
        buffer.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut object_offsets: HashMap<(u32, u16), u64> = HashMap::new();
        let objects_to_write = Self::collect_objects_to_write(delta);
        for (obj_id, delta_obj) in &objects_to_write {
            let offset = buffer.len() as u64;
            object_offsets.insert(*obj_id, offset);

            write!(buffer, "{} {} obj\n", obj_id.0, obj_id.1)
                .map_err(|e| PDFError::Generic(format!("failed to write object header: {e}")))?;
            Self::write_object(&mut buffer, &delta_obj.object)?;
            buffer.extend_from_slice(b"\nendobj\n");
        }

        let xref_start_offset = buffer.len() as u64;
        let total_object_count = delta.next_obj_num();
        Self::write_full_xref_table(&mut buffer, total_object_count, &object_offsets)?;

        write!(buffer, "trailer\n<< /Size {total_object_count} /Root ")
            .map_err(|e| PDFError::Generic(format!("failed to write trailer: {e}")))?;
        Self::write_object(&mut buffer, root)?;
        write!(buffer, " >>\nstartxref\n{xref_start_offset}\n")
            .map_err(|e| PDFError::Generic(format!("failed to write trailer: {e}")))?;
        buffer.extend_from_slice(b"%%EOF");

        Ok(buffer)
    }

    /// Merges a `DeltaLayer`'s modified and newly-added objects into one
    /// id-sorted, id-deduplicated list ready to be written in order.
    fn collect_objects_to_write(delta: &DeltaLayer) -> Vec<((u32, u16), &super::delta::DeltaObject)> {
        let mut objects_to_write: Vec<_> = delta
            .iter_modified()
            .map(|(id, obj)| (*id, obj))
            .chain(delta.iter_new_objects().map(|obj| ((obj.obj_num, obj.generation), obj)))
            .collect();
        // `iter_modified` is chained before `iter_new_objects`, and
        // `sort_by_key` is stable, so when a caller reserves an id via
        // `add_object` and later overwrites it via `modify_object` (e.g. to
        // fill in content that wasn't known yet at allocation time), the
        // modified version wins and the placeholder is dropped rather than
        // both being emitted as separate "obj" blocks for the same id.
        objects_to_write.sort_by_key(|(id, _)| *id);
        objects_to_write.dedup_by_key(|(id, _)| *id);
        objects_to_write
    }

    fn write_object<W: Write>(buffer: &mut W, obj: &PDFObject) -> PDFResult<()> {
        match obj {
            PDFObject::Null => buffer.write_all(b"null"),
            PDFObject::Boolean(b) => write!(buffer, "{}", if *b { "true" } else { "false" }),
            PDFObject::Integer(n) => write!(buffer, "{n}"),
            PDFObject::Real(n) => write!(buffer, "{n}"),
            PDFObject::String(s) => {
                buffer.write_all(b"(")?;
                Self::write_escaped_string(buffer, s)?;
                buffer.write_all(b")")
            }
            PDFObject::HexString(s) => {
                buffer.write_all(b"<")?;
                for byte in s {
                    write!(buffer, "{byte:02X}")?;
                }
                buffer.write_all(b">")
            }
            PDFObject::Name(name) => {
                buffer.write_all(b"/")?;
                Self::write_escaped_name(buffer, name)
            }
            PDFObject::Array(arr) => {
                buffer.write_all(b"[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        buffer.write_all(b" ")?;
                    }
                    Self::write_object(buffer, item)?;
                }
                buffer.write_all(b"]")
            }
            PDFObject::Dictionary(dict) => Self::write_dictionary(buffer, dict),
            PDFObject::Stream { dict, data } => {
                Self::write_dictionary(buffer, dict)?;
                buffer.write_all(b"\nstream\n")?;
                buffer.write_all(data)?;
                buffer.write_all(b"\nendstream")
            }
            PDFObject::Ref(r) => write!(buffer, "{} {} R", r.num, r.generation),
            PDFObject::EOF => return Err(PDFError::Generic("cannot write EOF marker as object".into())),
            PDFObject::Command(_) => {
                return Err(PDFError::Generic("cannot write a command token as a PDF object".into()));
            }
        }
        .map_err(|e| PDFError::Generic(format!("failed to write object: {e}")))
    }

    fn write_dictionary<W: Write>(buffer: &mut W, dict: &HashMap<String, PDFObject>) -> PDFResult<()> {
        buffer
            .write_all(b"<<")
            .map_err(|e| PDFError::Generic(format!("failed to write dict prefix: {e}")))?;
        let mut keys: Vec<_> = dict.keys().collect();
        keys.sort();
        for key in keys {
            buffer
                .write_all(b"/")
                .map_err(|e| PDFError::Generic(format!("failed to write key prefix: {e}")))?;
            Self::write_escaped_name(buffer, key)
                .map_err(|e| PDFError::Generic(format!("failed to write key: {e}")))?;
            buffer
                .write_all(b" ")
                .map_err(|e| PDFError::Generic(format!("failed to write separator: {e}")))?;
            Self::write_object(buffer, &dict[key])?;
            buffer
                .write_all(b" ")
                .map_err(|e| PDFError::Generic(format!("failed to write separator: {e}")))?;
        }
        buffer
            .write_all(b">>")
            .map_err(|e| PDFError::Generic(format!("failed to write dict suffix: {e}")))
    }

    /// Escapes a literal string per ISO 32000-1 §7.3.4.2: `\n \r \t \b \f \\ ( )`
    /// get their short escape, anything else outside printable ASCII is
    /// written as a three-digit octal escape.
    fn write_escaped_string<W: Write>(buffer: &mut W, s: &[u8]) -> std::io::Result<()> {
        for &byte in s {
            match byte {
                b'(' => buffer.write_all(b"\\("),
                b')' => buffer.write_all(b"\\)"),
                b'\\' => buffer.write_all(b"\\\\"),
                b'\n' => buffer.write_all(b"\\n"),
                b'\r' => buffer.write_all(b"\\r"),
                b'\t' => buffer.write_all(b"\\t"),
                0x08 => buffer.write_all(b"\\b"),
                0x0C => buffer.write_all(b"\\f"),
                0x20..=0x7E => buffer.write_all(&[byte]),
                other => write!(buffer, "\\{other:03o}"),
            }?;
        }
        Ok(())
    }

    /// Encodes `name` the way it would appear after a `/` in written PDF
    /// output (delimiters and spaces become `#XX` hex escapes). Exposed at
    /// crate visibility so resource-name remapping can match names using the
    /// same encoding written output uses.
    pub(crate) fn write_escaped_name<W: Write>(buffer: &mut W, name: &str) -> std::io::Result<()> {
        for byte in name.bytes() {
            match byte {
                b'/' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'%' | b'#' | b' ' => {
                    write!(buffer, "#{byte:02X}")
                }
                _ => buffer.write_all(&[byte]),
            }?;
        }
        Ok(())
    }

    /// Xref entries per the 20-byte classic format; consecutive ids are
    /// grouped into one subsection each. Used for incremental updates, which
    /// only ever cover the ids that actually changed.
    fn write_xref_table<W: Write>(buffer: &mut W, object_offsets: &HashMap<(u32, u16), u64>) -> PDFResult<()> {
        buffer
            .write_all(b"xref\n")
            .map_err(|e| PDFError::Generic(format!("failed to write xref header: {e}")))?;

        let mut obj_nums: Vec<u32> = object_offsets.keys().map(|(num, _)| *num).collect();
        obj_nums.sort_unstable();
        obj_nums.dedup();

        let mut i = 0;
        while i < obj_nums.len() {
            let start = obj_nums[i];
            let mut j = i;
            while j + 1 < obj_nums.len() && obj_nums[j + 1] == obj_nums[j] + 1 {
                j += 1;
            }
            let count = j - i + 1;
            write!(buffer, "{start} {count}\n")
                .map_err(|e| PDFError::Generic(format!("failed to write xref subsection header: {e}")))?;
            for num in &obj_nums[i..=j] {
                let offset = object_offsets
                    .get(&(*num, 0))
                    .ok_or_else(|| PDFError::Generic(format!("missing offset for object {num}")))?;
                write!(buffer, "{offset:010} 00000 n \n")
                    .map_err(|e| PDFError::Generic(format!("failed to write xref entry: {e}")))?;
            }
            i = j + 1;
        }

        Ok(())
    }

    /// Writes a single classic xref subsection covering `0..total_object_count`,
    /// with the mandatory free entry for object 0 first. Used for a
    /// from-scratch document's one and only xref section, where every id in
    /// range is guaranteed present (sequential allocation, no deletions).
    fn write_full_xref_table<W: Write>(
        buffer: &mut W,
        total_object_count: u32,
        object_offsets: &HashMap<(u32, u16), u64>,
    ) -> PDFResult<()> {
        buffer
            .write_all(b"xref\n")
            .map_err(|e| PDFError::Generic(format!("failed to write xref header: {e}")))?;
        write!(buffer, "0 {total_object_count}\n")
            .map_err(|e| PDFError::Generic(format!("failed to write xref subsection header: {e}")))?;
        buffer
            .write_all(b"0000000000 65535 f \n")
            .map_err(|e| PDFError::Generic(format!("failed to write xref entry: {e}")))?;
        for num in 1..total_object_count {
            let offset = object_offsets
                .get(&(num, 0))
                .ok_or_else(|| PDFError::Generic(format!("missing offset for object {num}")))?;
            write!(buffer, "{offset:010} 00000 n \n")
                .map_err(|e| PDFError::Generic(format!("failed to write xref entry: {e}")))?;
        }
        Ok(())
    }

    /// Packs xref-*stream* entry rows (ISO 32000-1 §7.5.8, `/W [1 ow 2]`):
    /// a free entry (type 0) for object 0, then an in-use entry (type 1,
    /// offset only — generation is always 0 for objects this writer
    /// allocates) for every id up to `total_object_count`. Returns the
    /// packed bytes and the offset field width chosen to fit the largest
    /// offset. Read back in the opposite direction by
    /// `XRef::parse_xref_stream` (`src/core/xref.rs`).
    fn write_xref_stream(total_object_count: u32, object_offsets: &HashMap<(u32, u16), u64>) -> PDFResult<(Vec<u8>, usize)> {
        let max_offset = object_offsets.values().copied().max().unwrap_or(0);
        let offset_width = Self::offset_byte_width(max_offset);

        let mut data = Vec::new();
        data.push(0u8);
        data.extend(std::iter::repeat(0u8).take(offset_width));
        data.extend_from_slice(&65535u16.to_be_bytes());

        for num in 1..total_object_count {
            let offset = *object_offsets
                .get(&(num, 0))
                .ok_or_else(|| PDFError::Generic(format!("missing offset for object {num}")))?;
            data.push(1u8);
            let offset_bytes = offset.to_be_bytes();
            data.extend_from_slice(&offset_bytes[8 - offset_width..]);
            data.extend_from_slice(&0u16.to_be_bytes());
        }

        Ok((data, offset_width))
    }

    /// Smallest byte width (1-8) that fits `max_offset`.
    fn offset_byte_width(max_offset: u64) -> usize {
        let mut width = 1usize;
        while width < 8 && max_offset >> (8 * width) != 0 {
            width += 1;
        }
        width
    }

    fn write_trailer<W: Write>(
        buffer: &mut W,
        xref_start_offset: u64,
        total_object_count: u32,
        prev_xref_offset: usize,
        root: &PDFObject,
    ) -> PDFResult<()> {
        write!(buffer, "trailer\n<< /Size {total_object_count} /Prev {prev_xref_offset} /Root ")
            .map_err(|e| PDFError::Generic(format!("failed to write trailer: {e}")))?;
        Self::write_object(buffer, root)?;
        write!(buffer, " >>\nstartxref\n{xref_start_offset}\n")
            .map_err(|e| PDFError::Generic(format!("failed to write trailer: {e}")))
    }
}
