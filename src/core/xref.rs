use super::base_stream::BaseStream;
use super::decode;
use super::encryption::DecryptionHelper;
use super::error::{PDFError, PDFResult};
use super::lexer::Lexer;
use super::parser::{PDFObject, Parser, Ref};
use super::stream::Stream;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::rc::Rc;

/// Cross-reference table entry.
///
/// Each entry describes where to find an indirect object in the PDF file.
#[derive(Debug, Clone)]
pub enum XRefEntry {
    /// Free entry - object number is available for reuse.
    Free { next_free: u64, generation: u16 },

    /// In-use entry - object is stored uncompressed at the given offset.
    InUse { offset: u64, generation: u16 },

    /// Compressed entry - object is stored in an object stream.
    Compressed { obj_stream_num: u32, index: u32 },

    /// An entry whose xref-stream type field didn't decode to one of the
    /// three recognized types (0/1/2). Recorded rather than treated as a
    /// hard parse failure, since one malformed slot shouldn't invalidate
    /// the rest of the table.
    Undefined,
}

impl XRefEntry {
    /// Returns true if this entry is free.
    pub fn is_free(&self) -> bool {
        matches!(self, XRefEntry::Free { .. })
    }

    /// Returns the generation number for this entry (0 if not applicable).
    pub fn generation(&self) -> u16 {
        match self {
            XRefEntry::Free { generation, .. } => *generation,
            XRefEntry::InUse { generation, .. } => *generation,
            XRefEntry::Compressed { .. } | XRefEntry::Undefined => 0,
        }
    }
}

/// Cross-reference table for a PDF document.
///
/// Maps object numbers to their locations in the file, resolving indirect
/// references like "5 0 R".
pub struct XRef {
    /// The entries in the xref table, indexed by object number.
    entries: Vec<Option<XRefEntry>>,

    /// Cache of parsed objects (object number -> PDFObject). Uses Rc to
    /// avoid expensive cloning of large objects, bounded by an LRU policy
    /// with a fast non-cryptographic hasher since keys are plain u32s.
    cache: LruCache<u32, Rc<PDFObject>, std::hash::BuildHasherDefault<rustc_hash::FxHasher>>,

    /// The trailer dictionary (from the first, i.e. most recent, xref
    /// section encountered).
    trailer: Option<PDFObject>,

    /// Stream to read PDF data from.
    stream: Box<dyn BaseStream>,

    /// Decryption context shared across every `Parser` this table spins
    /// up for `fetch`. `None` means the document isn't (or isn't yet
    /// known to be) encrypted.
    decryptor: Option<Rc<DecryptionHelper>>,
}

fn as_u32(obj: &PDFObject, what: &str) -> PDFResult<u32> {
    obj.as_i64()
        .map(|n| n as u32)
        .ok_or_else(|| PDFError::Generic(format!("expected {what}, got {obj:?}")))
}

fn as_usize(obj: &PDFObject, what: &str) -> PDFResult<usize> {
    obj.as_i64()
        .map(|n| n as usize)
        .ok_or_else(|| PDFError::Generic(format!("expected {what}, got {obj:?}")))
}

fn clamp_generation(n: i64) -> u16 {
    if !(0..=u16::MAX as i64).contains(&n) {
        log::warn!("generation number {n} out of range, clamping to {}", u16::MAX);
        u16::MAX
    } else {
        n as u16
    }
}

impl XRef {
    /// Creates a new XRef table. The resolved-object cache holds up to
    /// 1000 objects, enough for most documents while keeping memory
    /// bounded for very large ones.
    pub fn new(stream: Box<dyn BaseStream>) -> Self {
        let capacity = NonZeroUsize::new(1000).unwrap();
        let cache = LruCache::with_hasher(
            capacity,
            std::hash::BuildHasherDefault::<rustc_hash::FxHasher>::default(),
        );

        XRef {
            entries: Vec::new(),
            cache,
            trailer: None,
            stream,
            decryptor: None,
        }
    }

    /// Sets the stream position for parsing.
    pub fn set_stream_pos(&mut self, pos: usize) -> PDFResult<()> {
        self.stream.set_pos(pos)
    }

    /// Installs the decryption context used for every subsequently fetched
    /// (or re-fetched, once the cache is cleared) object. Clears the object
    /// cache, since any previously cached object may have been fetched
    /// before the password was verified and decrypted incorrectly (or not
    /// at all).
    pub fn set_decryptor(&mut self, decryptor: Rc<DecryptionHelper>) {
        self.decryptor = Some(decryptor);
        self.cache.clear();
    }

    /// Parses the cross-reference table starting at the current stream
    /// position, following `/Prev` entries to cover incremental updates.
    /// Handles both classic xref tables and xref streams (PDF 1.5+).
    pub fn parse(&mut self) -> PDFResult<()> {
        let start_pos = self.stream.pos();

        let mut xref_queue = vec![start_pos];
        let mut parsed_positions = std::collections::HashSet::new();
        let mut main_trailer: Option<PDFObject> = None;

        while let Some(pos) = xref_queue.pop() {
            if !parsed_positions.insert(pos) {
                continue;
            }

            self.stream.set_pos(pos)?;

            let lexer = Lexer::new(
                self.stream
                    .make_sub_stream(pos, self.stream.length() - pos)?,
            )?;
            let mut parser = Parser::new(lexer)?;

            let obj = parser.get_object()?;

            let trailer = if obj.is_command("xref") {
                self.read_xref_table(&mut parser)?;

                // read_xref_table consumes the "trailer" keyword itself.
                let trailer = parser.get_object()?;
                if !matches!(trailer, PDFObject::Dictionary(_)) {
                    return Err(PDFError::Generic("expected trailer dictionary".to_string()));
                }
                trailer
            } else if obj.as_i64().is_some() {
                // Might be an xref stream: N 0 obj << /Type /XRef ... >> stream ... endstream
                let generation = parser.get_object()?;
                let obj_keyword = parser.get_object()?;

                if generation.as_i64() != Some(0) {
                    return Err(PDFError::Generic(
                        "xref stream must have generation 0".to_string(),
                    ));
                }
                if !obj_keyword.is_command("obj") {
                    return Err(PDFError::Generic(format!(
                        "expected 'obj' keyword, got {obj_keyword:?}"
                    )));
                }

                let xref_obj = parser.get_object()?;
                match xref_obj {
                    PDFObject::Stream { dict, data } => {
                        match dict.get("Type") {
                            Some(PDFObject::Name(type_name)) if type_name == "XRef" => {}
                            Some(PDFObject::Name(type_name)) => {
                                return Err(PDFError::Generic(format!(
                                    "expected /Type /XRef, got /Type /{type_name}"
                                )));
                            }
                            _ => {
                                return Err(PDFError::Generic(
                                    "xref stream missing /Type entry".to_string(),
                                ));
                            }
                        }

                        self.parse_xref_stream(&dict, &data)?;
                        PDFObject::Dictionary(dict)
                    }
                    _ => return Err(PDFError::Generic("expected xref stream object".to_string())),
                }
            } else {
                return Err(PDFError::Generic(format!(
                    "expected 'xref' keyword or object number, got {obj:?}"
                )));
            };

            if main_trailer.is_none() {
                main_trailer = Some(trailer.clone());
            }

            if let PDFObject::Dictionary(ref dict) = trailer {
                match dict.get("Prev") {
                    Some(prev_obj) if prev_obj.as_i64().is_some() => {
                        xref_queue.push(prev_obj.as_i64().unwrap() as usize);
                    }
                    Some(PDFObject::Ref(r)) => {
                        // Non-compliant: /Prev should be a direct integer, not
                        // a reference. Best-effort: treat the object number
                        // as a byte offset, which is what malformed writers
                        // producing this shape have been observed to mean.
                        log::warn!("/Prev is an indirect reference ({} {} R), treating object number as offset", r.num, r.generation);
                        xref_queue.push(r.num as usize);
                    }
                    Some(_) | None => {}
                }
            }
        }

        self.trailer = main_trailer;

        Ok(())
    }

    /// Parses an xref stream (PDF 1.5+), decoding `/W`-described binary rows
    /// into `XRefEntry` values over the ranges given by `/Index` (default
    /// `[0 Size]`).
    fn parse_xref_stream(&mut self, dict: &HashMap<String, PDFObject>, data: &[u8]) -> PDFResult<()> {
        let w_array = dict
            .get("W")
            .ok_or_else(|| PDFError::Generic("xref stream missing /W entry".to_string()))?;

        let (w1, w2, w3) = match w_array {
            PDFObject::Array(arr) if arr.len() == 3 => (
                as_usize(&arr[0], "/W[0]")?,
                as_usize(&arr[1], "/W[1]")?,
                as_usize(&arr[2], "/W[2]")?,
            ),
            PDFObject::Array(arr) => {
                return Err(PDFError::Generic(format!(
                    "xref stream /W must have 3 elements, got {}",
                    arr.len()
                )));
            }
            _ => return Err(PDFError::Generic("/W must be an array".to_string())),
        };

        let index_array = if let Some(index) = dict.get("Index") {
            match index {
                PDFObject::Array(arr) => arr.clone(),
                _ => return Err(PDFError::Generic("/Index must be an array".to_string())),
            }
        } else {
            let size = dict
                .get("Size")
                .ok_or_else(|| PDFError::Generic("xref stream missing /Size".to_string()))?;
            let size = as_u32(size, "/Size")?;
            use smallvec::smallvec;
            smallvec![
                Box::new(PDFObject::Integer(0)),
                Box::new(PDFObject::Integer(size as i64)),
            ]
        };

        let filter_name = dict.get("Filter").and_then(|f| match f {
            PDFObject::Name(name) => Some(name.as_str()),
            _ => None,
        });

        let mut decompressed_data = decode::decode_stream(data, filter_name)
            .map_err(|e| PDFError::Generic(format!("xref stream decode error: {e}")))?;

        if let Some(PDFObject::Dictionary(parms)) = dict.get("DecodeParms") {
            apply_png_predictor_if_present(parms, &mut decompressed_data)?;
        }

        let entry_size = w1 + w2 + w3;
        let mut pos = 0;

        let mut i = 0;
        while i < index_array.len() {
            let first = as_u32(&index_array[i], "Index entry")?;
            let count = as_usize(&index_array[i + 1], "Index entry")?;

            for j in 0..count {
                if pos + entry_size > decompressed_data.len() {
                    return Err(PDFError::Generic("xref stream data truncated".to_string()));
                }

                let entry_type = if w1 > 0 {
                    read_big_endian(&decompressed_data[pos..pos + w1])
                } else {
                    1
                };
                pos += w1;

                let field2 = if w2 > 0 {
                    read_big_endian(&decompressed_data[pos..pos + w2])
                } else {
                    0
                };
                pos += w2;

                let field3 = if w3 > 0 {
                    read_big_endian(&decompressed_data[pos..pos + w3])
                } else {
                    0
                };
                pos += w3;

                let obj_num = first + j as u32;
                let entry = match entry_type {
                    0 => XRefEntry::Free {
                        next_free: field2,
                        generation: clamp_generation(field3 as i64),
                    },
                    1 => XRefEntry::InUse {
                        offset: field2,
                        generation: clamp_generation(field3 as i64),
                    },
                    2 => XRefEntry::Compressed {
                        obj_stream_num: field2 as u32,
                        index: field3 as u32,
                    },
                    other => {
                        log::warn!("xref stream entry {obj_num} has unrecognized type {other}, marking undefined");
                        XRefEntry::Undefined
                    }
                };

                while self.entries.len() <= obj_num as usize {
                    self.entries.push(None);
                }

                if self.entries[obj_num as usize].is_none() {
                    self.entries[obj_num as usize] = Some(entry);
                }
            }

            i += 2;
        }

        Ok(())
    }

    /// Reads xref table subsections until the `trailer` keyword.
    fn read_xref_table(&mut self, parser: &mut Parser) -> PDFResult<()> {
        loop {
            let first_obj = parser.get_object()?;

            if first_obj.is_command("trailer") {
                return Ok(());
            }

            let first = as_u32(&first_obj, "subsection start number or 'trailer'")?;
            let count_obj = parser.get_object()?;
            let count = as_u32(&count_obj, "subsection count")?;

            let needed_size = (first + count) as usize;
            if self.entries.len() < needed_size {
                self.entries.resize(needed_size, None);
            }

            for i in 0..count {
                let entry = self.read_xref_entry(parser)?;
                let obj_num = (first + i) as usize;

                if self.entries[obj_num].is_none() {
                    self.entries[obj_num] = Some(entry);
                }
            }
        }
    }

    /// Reads a single xref entry: `offset generation type` (e.g.
    /// `0000000015 00000 n`).
    fn read_xref_entry(&mut self, parser: &mut Parser) -> PDFResult<XRefEntry> {
        let offset_obj = parser.get_object()?;
        let offset = offset_obj
            .as_i64()
            .map(|n| n as u64)
            .ok_or_else(|| PDFError::Generic(format!("expected offset in xref entry, got {offset_obj:?}")))?;

        let gen_obj = parser.get_object()?;
        let generation = gen_obj
            .as_i64()
            .map(clamp_generation)
            .ok_or_else(|| PDFError::Generic(format!("expected generation in xref entry, got {gen_obj:?}")))?;

        let type_obj = parser.get_object()?;
        if type_obj.is_command("f") {
            Ok(XRefEntry::Free {
                next_free: offset,
                generation,
            })
        } else if type_obj.is_command("n") {
            Ok(XRefEntry::InUse { offset, generation })
        } else {
            Err(PDFError::Generic(format!(
                "expected 'f' or 'n' in xref entry, got {type_obj:?}"
            )))
        }
    }

    /// Gets an entry from the xref table.
    pub fn get_entry(&self, obj_num: u32) -> Option<&XRefEntry> {
        self.entries.get(obj_num as usize)?.as_ref()
    }

    /// Fetches an object from a compressed object stream (ObjStm).
    ///
    /// Object streams pack multiple objects, prefixed by an index of
    /// `N1 offset1 N2 offset2 ...` pairs giving each object's byte offset
    /// relative to `/First`.
    fn fetch_compressed(&mut self, obj_stream_num: u32, index: u32) -> PDFResult<Rc<PDFObject>> {
        let obj_stream_obj = self.fetch(obj_stream_num, 0)?;

        match &*obj_stream_obj {
            PDFObject::Stream { dict, data } => {
                if let Some(PDFObject::Name(type_name)) = dict.get("Type") {
                    if type_name != "ObjStm" {
                        return Err(PDFError::Generic(format!("expected ObjStm type, got /{type_name}")));
                    }
                }

                let n = as_u32(
                    dict.get("N")
                        .ok_or_else(|| PDFError::Generic("ObjStm missing /N parameter".to_string()))?,
                    "/N",
                )?;
                let first = as_usize(
                    dict.get("First")
                        .ok_or_else(|| PDFError::Generic("ObjStm missing /First parameter".to_string()))?,
                    "/First",
                )?;

                if index >= n {
                    return Err(PDFError::Generic(format!(
                        "index {index} out of range for ObjStm with {n} objects"
                    )));
                }

                let filter_name = dict.get("Filter").and_then(|f| match f {
                    PDFObject::Name(name) => Some(name.as_str()),
                    _ => None,
                });

                let mut decompressed_data = decode::decode_stream(data, filter_name)
                    .map_err(|e| PDFError::Generic(format!("ObjStm decode error: {e}")))?;

                if let Some(PDFObject::Dictionary(parms)) = dict.get("DecodeParms") {
                    apply_png_predictor_if_present(parms, &mut decompressed_data)?;
                }

                let index_stream = Stream::from_bytes(decompressed_data[..first].to_vec());
                let lexer = Lexer::new(Box::new(index_stream) as Box<dyn BaseStream>)?;
                let mut parser = Parser::new(lexer)?;

                let mut obj_nums = Vec::with_capacity(n as usize);
                let mut offsets = Vec::with_capacity(n as usize);

                for _ in 0..n {
                    let num = parser.get_object()?;
                    let offset = parser.get_object()?;
                    obj_nums.push(as_u32(&num, "ObjStm object number")?);
                    offsets.push(as_usize(&offset, "ObjStm offset")?);
                }

                let obj_offset = first + offsets[index as usize];
                let obj_length = if (index as usize) < offsets.len() - 1 {
                    offsets[index as usize + 1]
                } else {
                    decompressed_data.len() - obj_offset
                };

                let obj_data = decompressed_data[obj_offset..obj_offset + obj_length].to_vec();
                let obj_stream = Stream::from_bytes(obj_data);
                let obj_lexer = Lexer::new(Box::new(obj_stream) as Box<dyn BaseStream>)?;
                let mut obj_parser = Parser::new(obj_lexer)?;

                // No "obj"/"endobj" wrappers inside an ObjStm.
                let object = Rc::new(obj_parser.get_object()?);

                let actual_obj_num = obj_nums[index as usize];
                self.cache.put(actual_obj_num, Rc::clone(&object));

                Ok(object)
            }
            PDFObject::Dictionary(_) => Err(PDFError::Generic(
                "ObjStm is a dictionary without stream data".to_string(),
            )),
            _ => Err(PDFError::Generic("ObjStm is not a stream or dictionary".to_string())),
        }
    }

    /// Fetches an indirect object by reference, resolving "5 0 R" to its
    /// actual object. Parsed objects are cached behind an `Rc` so repeated
    /// fetches (common while walking the page tree) don't re-parse or
    /// re-clone large dictionaries.
    pub fn fetch(&mut self, obj_num: u32, generation: u16) -> PDFResult<Rc<PDFObject>> {
        if let Some(cached) = self.cache.get(&obj_num) {
            return Ok(Rc::clone(cached));
        }

        let entry = self
            .get_entry(obj_num)
            .ok_or_else(|| PDFError::Generic(format!("object {obj_num} not found in xref")))?;

        match entry {
            XRefEntry::Free { .. } => Err(PDFError::Generic(format!("cannot fetch free object {obj_num}"))),

            XRefEntry::Undefined => Err(PDFError::xref_error(format!(
                "object {obj_num} has an undefined xref entry"
            ))),

            XRefEntry::InUse {
                offset,
                generation: entry_gen,
            } => {
                if generation != *entry_gen {
                    return Err(PDFError::Generic(format!(
                        "generation mismatch for object {obj_num}: expected {entry_gen}, got {generation}"
                    )));
                }

                let offset_value = *offset;
                let sub_stream = self
                    .stream
                    .make_sub_stream(offset_value as usize, self.stream.length() - offset_value as usize)?;

                let lexer = Lexer::new(sub_stream)?;
                let mut parser = Parser::new(lexer)?;

                if let Some(decryptor) = &self.decryptor {
                    parser.set_decryption_hook(Box::new(Rc::clone(decryptor)));
                    parser.set_current_object(obj_num, generation);
                }

                // Installs a resolver so the parser can resolve indirect
                // /Length references while reading this object's stream
                // body, without which it would have to fall back to
                // scanning for "endstream" and risk swallowing "endobj".
                //
                // Capturing `&mut self` through a raw pointer is the only
                // way to give the closure access to `fetch` without making
                // XRef self-referential; it's sound because the closure is
                // only invoked synchronously inside `parser.get_object()`
                // below, while this `&mut self` borrow is still alive and
                // nothing else touches `self` concurrently.
                let self_ptr = self as *mut XRef;
                parser.set_ref_resolver(move |num, generation| {
                    unsafe { (*self_ptr).fetch(num, generation) }.map(|rc| (*rc).clone())
                });

                let num_obj = parser.get_object()?;
                let parsed_num = as_u32(&num_obj, "object number")?;
                if parsed_num != obj_num {
                    return Err(PDFError::Generic(format!(
                        "object number mismatch: expected {obj_num}, got {parsed_num}"
                    )));
                }

                let gen_obj = parser.get_object()?;
                let parsed_gen = gen_obj
                    .as_i64()
                    .map(clamp_generation)
                    .ok_or_else(|| PDFError::Generic(format!("expected generation number, got {gen_obj:?}")))?;
                if parsed_gen != generation {
                    return Err(PDFError::Generic(format!(
                        "generation number mismatch: expected {generation}, got {parsed_gen}"
                    )));
                }

                let obj_keyword = parser.get_object()?;
                if !obj_keyword.is_command("obj") {
                    return Err(PDFError::Generic(format!("expected 'obj' keyword, got {obj_keyword:?}")));
                }

                let object = parser.get_object()?;
                let object_rc = Rc::new(object);
                self.cache.put(obj_num, Rc::clone(&object_rc));

                Ok(object_rc)
            }

            XRefEntry::Compressed {
                obj_stream_num,
                index,
            } => self.fetch_compressed(*obj_stream_num, *index),
        }
    }

    /// Fetches an object if it's a reference, otherwise returns it as-is.
    pub fn fetch_if_ref(&mut self, obj: &PDFObject) -> PDFResult<PDFObject> {
        match obj {
            PDFObject::Ref(r) => {
                let rc_obj = self.fetch(r.num, r.generation)?;
                Ok((*rc_obj).clone())
            }
            _ => Ok(obj.clone()),
        }
    }

    /// Returns the trailer dictionary.
    pub fn trailer(&self) -> Option<&PDFObject> {
        self.trailer.as_ref()
    }

    /// Returns the catalog (root) dictionary.
    pub fn catalog(&mut self) -> PDFResult<PDFObject> {
        let root_ref = {
            let trailer = self
                .trailer
                .as_ref()
                .ok_or_else(|| PDFError::Generic("no trailer dictionary".to_string()))?;

            let trailer_dict = match trailer {
                PDFObject::Dictionary(dict) => dict,
                _ => return Err(PDFError::Generic("trailer is not a dictionary".to_string())),
            };

            trailer_dict
                .get("Root")
                .ok_or_else(|| PDFError::Generic("no /Root entry in trailer".to_string()))?
                .clone()
        };

        let rc_catalog = match &root_ref {
            PDFObject::Ref(r) => self.fetch(r.num, r.generation)?,
            _ => return Ok(root_ref),
        };

        Ok((*rc_catalog).clone())
    }

    /// Returns the number of entries in the xref table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the xref table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn apply_png_predictor_if_present(parms: &HashMap<String, PDFObject>, data: &mut Vec<u8>) -> PDFResult<()> {
    let Some(predictor) = parms.get("Predictor").and_then(PDFObject::as_i64) else {
        return Ok(());
    };

    if !(10..=15).contains(&predictor) {
        return Ok(());
    }

    let columns = parms.get("Columns").and_then(PDFObject::as_i64).unwrap_or(1) as usize;
    let colors = parms.get("Colors").and_then(PDFObject::as_i64).unwrap_or(1) as usize;
    let bits_per_component = parms
        .get("BitsPerComponent")
        .and_then(PDFObject::as_i64)
        .unwrap_or(8) as usize;

    *data = decode::decode_png_predictor(data, colors, bits_per_component, columns)
        .map_err(|e| PDFError::Generic(format!("PNG predictor decode error: {e}")))?;

    Ok(())
}

/// Reads a big-endian integer from bytes (xref stream entry fields).
fn read_big_endian(bytes: &[u8]) -> u64 {
    let mut result = 0u64;
    for &byte in bytes {
        result = (result << 8) | (byte as u64);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Stream;

    #[test]
    fn test_xref_entry_is_free() {
        let free_entry = XRefEntry::Free {
            next_free: 0,
            generation: 65535,
        };
        assert!(free_entry.is_free());

        let in_use_entry = XRefEntry::InUse {
            offset: 100,
            generation: 0,
        };
        assert!(!in_use_entry.is_free());
    }

    #[test]
    fn test_xref_entry_generation() {
        let entry = XRefEntry::InUse {
            offset: 100,
            generation: 5,
        };
        assert_eq!(entry.generation(), 5);
    }

    #[test]
    fn test_undefined_entry_is_not_free() {
        assert!(!XRefEntry::Undefined.is_free());
        assert_eq!(XRefEntry::Undefined.generation(), 0);
    }

    #[test]
    fn test_parse_simple_xref() {
        let data = b"xref\n\
            0 1\n\
            0000000000 65535 f\n\
            trailer\n\
            << /Size 1 >>\n";

        let stream = Box::new(Stream::from_bytes(data.to_vec())) as Box<dyn BaseStream>;
        let mut xref = XRef::new(stream);

        xref.parse().unwrap();

        let entry = xref.get_entry(0).unwrap();
        assert!(entry.is_free());
        assert_eq!(entry.generation(), 65535);

        assert!(xref.trailer().is_some());
    }

    #[test]
    fn test_parse_xref_with_multiple_entries() {
        let data = b"xref\n\
            0 3\n\
            0000000000 65535 f\n\
            0000000015 00000 n\n\
            0000000079 00000 n\n\
            trailer\n\
            << /Size 3 >>\n";

        let stream = Box::new(Stream::from_bytes(data.to_vec())) as Box<dyn BaseStream>;
        let mut xref = XRef::new(stream);

        xref.parse().unwrap();

        assert_eq!(xref.len(), 3);

        let entry0 = xref.get_entry(0).unwrap();
        assert!(entry0.is_free());

        let entry1 = xref.get_entry(1).unwrap();
        assert!(!entry1.is_free());
        if let XRefEntry::InUse { offset, generation } = entry1 {
            assert_eq!(*offset, 15);
            assert_eq!(*generation, 0);
        } else {
            panic!("expected in-use entry");
        }

        let entry2 = xref.get_entry(2).unwrap();
        if let XRefEntry::InUse { offset, generation } = entry2 {
            assert_eq!(*offset, 79);
            assert_eq!(*generation, 0);
        } else {
            panic!("expected in-use entry");
        }
    }

    #[test]
    fn test_fetch_indirect_object() {
        let data = b"1 0 obj\n\
            42\n\
            endobj\n\
            xref\n\
            0 2\n\
            0000000000 65535 f\n\
            0000000000 00000 n\n\
            trailer\n\
            << /Size 2 >>\n";

        let stream = Box::new(Stream::from_bytes(data.to_vec())) as Box<dyn BaseStream>;
        let mut xref = XRef::new(stream);

        let xref_pos = data.windows(4).position(|w| w == b"xref").expect("xref not found");
        xref.stream.set_pos(xref_pos).unwrap();
        xref.parse().unwrap();

        let obj = xref.fetch(1, 0).unwrap();
        assert_eq!(*obj, PDFObject::Integer(42));
    }

    #[test]
    fn test_fetch_if_ref() {
        let data = b"1 0 obj\n\
            42\n\
            endobj\n\
            xref\n\
            0 2\n\
            0000000000 65535 f\n\
            0000000000 00000 n\n\
            trailer\n\
            << /Size 2 >>\n";

        let stream = Box::new(Stream::from_bytes(data.to_vec())) as Box<dyn BaseStream>;
        let mut xref = XRef::new(stream);

        let xref_pos = data.windows(4).position(|w| w == b"xref").expect("xref not found");
        xref.stream.set_pos(xref_pos).unwrap();
        xref.parse().unwrap();

        let ref_obj = PDFObject::Ref(Ref::new(1, 0));
        let result = xref.fetch_if_ref(&ref_obj).unwrap();
        assert_eq!(result, PDFObject::Integer(42));

        let direct_obj = PDFObject::Integer(100);
        let result = xref.fetch_if_ref(&direct_obj).unwrap();
        assert_eq!(result, PDFObject::Integer(100));
    }

    #[test]
    fn test_parse_xref_stream() {
        // N 0 obj << /Type /XRef /Size 3 /W [1 2 1] /Length 12 >> stream ... endstream endobj
        let mut data = Vec::new();

        let xref_data = vec![
            0x00, 0x00, 0x00, 0xFF, // Entry 0: free, next_free=0, generation=255
            0x01, 0x00, 0x0F, 0x00, // Entry 1: in-use, offset=15, generation=0
            0x01, 0x00, 0x4F, 0x00, // Entry 2: in-use, offset=79, generation=0
        ];

        data.extend_from_slice(b"1 0 obj\n");
        data.extend_from_slice(b"<< /Type /XRef /Size 3 /W [1 2 1] /Length 12 >>\n");
        data.extend_from_slice(b"stream\n");
        data.extend_from_slice(&xref_data);
        data.extend_from_slice(b"endstream\nendobj\n");

        let stream = Box::new(Stream::from_bytes(data)) as Box<dyn BaseStream>;
        let mut xref = XRef::new(stream);

        xref.parse().unwrap();

        assert_eq!(xref.len(), 3);

        let entry0 = xref.get_entry(0).unwrap();
        assert!(entry0.is_free());
        assert_eq!(entry0.generation(), 255);

        let entry1 = xref.get_entry(1).unwrap();
        assert!(!entry1.is_free());
        if let XRefEntry::InUse { offset, generation } = entry1 {
            assert_eq!(*offset, 15);
            assert_eq!(*generation, 0);
        } else {
            panic!("expected in-use entry, got {entry1:?}");
        }

        let entry2 = xref.get_entry(2).unwrap();
        if let XRefEntry::InUse { offset, generation } = entry2 {
            assert_eq!(*offset, 79);
            assert_eq!(*generation, 0);
        } else {
            panic!("expected in-use entry, got {entry2:?}");
        }

        let trailer = xref.trailer().unwrap();
        if let PDFObject::Dictionary(dict) = trailer {
            match dict.get("Type") {
                Some(PDFObject::Name(type_name)) => assert_eq!(type_name, "XRef"),
                other => panic!("expected /Type /XRef in trailer, got {other:?}"),
            }
            assert_eq!(dict.get("Size").and_then(PDFObject::as_i64), Some(3));
        } else {
            panic!("expected dictionary trailer");
        }
    }

    #[test]
    fn test_parse_xref_stream_with_compressed_entries() {
        let mut data = Vec::new();

        let xref_data = vec![
            0x00, 0x00, 0x00, 0xFF, // Entry 0: free
            0x02, 0x00, 0x05, 0x00, // Entry 1: compressed in stream 5, index 0
            0x02, 0x00, 0x05, 0x01, // Entry 2: compressed in stream 5, index 1
        ];

        data.extend_from_slice(b"1 0 obj\n");
        data.extend_from_slice(b"<< /Type /XRef /Size 3 /W [1 2 1] /Length 12 >>\n");
        data.extend_from_slice(b"stream\n");
        data.extend_from_slice(&xref_data);
        data.extend_from_slice(b"endstream\nendobj\n");

        let stream = Box::new(Stream::from_bytes(data)) as Box<dyn BaseStream>;
        let mut xref = XRef::new(stream);

        xref.parse().unwrap();

        assert_eq!(xref.len(), 3);

        let entry0 = xref.get_entry(0).unwrap();
        assert!(entry0.is_free());

        let entry1 = xref.get_entry(1).unwrap();
        if let XRefEntry::Compressed { obj_stream_num, index } = entry1 {
            assert_eq!(*obj_stream_num, 5);
            assert_eq!(*index, 0);
        } else {
            panic!("expected compressed entry, got {entry1:?}");
        }

        let entry2 = xref.get_entry(2).unwrap();
        if let XRefEntry::Compressed { obj_stream_num, index } = entry2 {
            assert_eq!(*obj_stream_num, 5);
            assert_eq!(*index, 1);
        } else {
            panic!("expected compressed entry, got {entry2:?}");
        }
    }

    #[test]
    fn test_xref_stream_unrecognized_type_is_undefined() {
        let mut data = Vec::new();

        let xref_data = vec![
            0x05, 0x00, 0x00, 0x00, // Entry 0: unrecognized type 5
        ];

        data.extend_from_slice(b"1 0 obj\n");
        data.extend_from_slice(b"<< /Type /XRef /Size 1 /W [1 2 1] /Length 4 >>\n");
        data.extend_from_slice(b"stream\n");
        data.extend_from_slice(&xref_data);
        data.extend_from_slice(b"endstream\nendobj\n");

        let stream = Box::new(Stream::from_bytes(data)) as Box<dyn BaseStream>;
        let mut xref = XRef::new(stream);

        xref.parse().unwrap();

        assert!(matches!(xref.get_entry(0), Some(XRefEntry::Undefined)));
    }
}
