//! Delta layer for tracking PDF document modifications.
//!
//! The delta layer lets a caller describe edits to a parsed document without
//! mutating anything the xref table already points at. Modifications are
//! tracked separately and later serialized as a PDF incremental update,
//! keeping the base file byte-for-byte intact.

use super::error::{PDFError, PDFResult};
use super::parser::{PDFObject, Ref};
use std::collections::{HashMap, HashSet};

/// Object reference id (object number, generation).
pub type ObjectId = (u32, u16);

/// One object tracked by a [`DeltaLayer`], either an override of a base
/// object or a brand new one.
#[derive(Debug, Clone)]
pub struct DeltaObject {
    pub object: PDFObject,
    pub obj_num: u32,
    pub generation: u16,
}

/// Callback for fetching an object from the base document when a command
/// needs to read state it hasn't already overridden.
pub type BaseObjectFetcher<'a> = dyn Fn(Ref) -> PDFResult<PDFObject> + 'a;

/// A reversible edit applied through a [`DeltaLayer`].
pub trait Command {
    fn execute<'a>(
        &mut self,
        delta: &mut DeltaLayer,
        fetch_base: Option<&'a BaseObjectFetcher<'a>>,
    ) -> PDFResult<()>;

    fn undo(&mut self, delta: &mut DeltaLayer) -> PDFResult<()>;

    fn redo(&mut self, delta: &mut DeltaLayer) -> PDFResult<()>;
}

/// Tracks modifications, additions, and deletions made to a base PDF
/// without touching its bytes. `PDFWriter::write_incremental_update` turns
/// the accumulated state into an appendable update.
pub struct DeltaLayer {
    modified: HashMap<ObjectId, DeltaObject>,
    new_objects: Vec<DeltaObject>,
    deleted: HashSet<ObjectId>,
    history: Vec<Box<dyn Command>>,
    undo_stack: Vec<Box<dyn Command>>,
    next_obj_num: u32,
    base_pdf_size: u32,
}

impl std::fmt::Debug for DeltaLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaLayer")
            .field("modified", &self.modified)
            .field("new_objects", &self.new_objects)
            .field("deleted", &self.deleted)
            .field("history_count", &self.history.len())
            .field("undo_stack_count", &self.undo_stack.len())
            .field("next_obj_num", &self.next_obj_num)
            .field("base_pdf_size", &self.base_pdf_size)
            .finish()
    }
}

impl DeltaLayer {
    /// `base_pdf_size` is the object count already in use in the source
    /// document; new objects are numbered starting there.
    pub fn new(base_pdf_size: u32) -> Self {
        Self {
            modified: HashMap::new(),
            new_objects: Vec::new(),
            deleted: HashSet::new(),
            history: Vec::new(),
            undo_stack: Vec::new(),
            next_obj_num: base_pdf_size,
            base_pdf_size,
        }
    }

    pub fn modify_object(&mut self, obj_ref: Ref, new_obj: PDFObject) {
        let key = obj_ref.as_id();
        self.deleted.remove(&key);
        self.modified.insert(
            key,
            DeltaObject {
                object: new_obj,
                obj_num: obj_ref.num,
                generation: obj_ref.generation,
            },
        );
    }

    pub fn add_object(&mut self, obj: PDFObject) -> Ref {
        let obj_num = self.next_obj_num;
        self.next_obj_num += 1;
        self.new_objects.push(DeltaObject {
            object: obj,
            obj_num,
            generation: 0,
        });
        Ref::new(obj_num, 0)
    }

    pub fn delete_object(&mut self, obj_ref: Ref) {
        let key = obj_ref.as_id();
        self.deleted.insert(key);
        self.modified.remove(&key);
    }

    pub fn is_deleted(&self, obj_ref: &Ref) -> bool {
        self.deleted.contains(&obj_ref.as_id())
    }

    pub fn get(&self, obj_ref: &Ref) -> Option<&DeltaObject> {
        let key = obj_ref.as_id();
        if let Some(obj) = self.modified.get(&key) {
            return Some(obj);
        }
        self.new_objects
            .iter()
            .find(|obj| obj.obj_num == obj_ref.num && obj.generation == obj_ref.generation)
    }

    pub fn execute_command<'a>(
        &mut self,
        mut cmd: Box<dyn Command>,
        fetch_base: Option<&'a BaseObjectFetcher<'a>>,
    ) -> PDFResult<()> {
        cmd.execute(self, fetch_base)?;
        self.history.push(cmd);
        self.undo_stack.clear();
        Ok(())
    }

    pub fn undo(&mut self) -> PDFResult<()> {
        let mut cmd = self
            .history
            .pop()
            .ok_or_else(|| PDFError::Generic("nothing to undo".into()))?;
        cmd.undo(self)?;
        self.undo_stack.push(cmd);
        Ok(())
    }

    pub fn redo(&mut self) -> PDFResult<()> {
        let mut cmd = self
            .undo_stack
            .pop()
            .ok_or_else(|| PDFError::Generic("nothing to redo".into()))?;
        cmd.redo(self)?;
        self.history.push(cmd);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.modified.clear();
        self.new_objects.clear();
        self.deleted.clear();
        self.history.clear();
        self.undo_stack.clear();
        self.next_obj_num = self.base_pdf_size;
    }

    pub fn change_count(&self) -> usize {
        self.modified.len() + self.new_objects.len() + self.deleted.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn next_obj_num(&self) -> u32 {
        self.next_obj_num
    }

    pub fn iter_modified(&self) -> impl Iterator<Item = (&ObjectId, &DeltaObject)> {
        self.modified.iter()
    }

    pub fn iter_new_objects(&self) -> impl Iterator<Item = &DeltaObject> {
        self.new_objects.iter()
    }

    pub fn iter_deleted(&self) -> impl Iterator<Item = &ObjectId> {
        self.deleted.iter()
    }
}

/// Sets a page's `/Rotate` entry to a multiple of 90 degrees.
#[derive(Debug)]
pub struct RotatePageCommand {
    page_ref: Ref,
    degrees: i64,
    original_rotation: Option<i64>,
}

impl RotatePageCommand {
    /// Clamps `degrees` to 0 if it isn't a multiple of 90, rather than
    /// rejecting it — a page rotation is cosmetic, not structural, so an
    /// out-of-range request degrades to "leave unrotated" instead of
    /// failing the whole edit.
    pub fn new(page_ref: Ref, degrees: i64) -> Self {
        let degrees = if degrees % 90 == 0 { degrees } else { 0 };
        Self {
            page_ref,
            degrees,
            original_rotation: None,
        }
    }
}

impl Command for RotatePageCommand {
    fn execute<'a>(
        &mut self,
        delta: &mut DeltaLayer,
        fetch_base: Option<&'a BaseObjectFetcher<'a>>,
    ) -> PDFResult<()> {
        let page_obj = match delta.get(&self.page_ref) {
            Some(delta_obj) => delta_obj.object.clone(),
            None => {
                let fetcher = fetch_base.ok_or_else(|| {
                    PDFError::Generic(
                        "cannot fetch base page object without a fetch callback".into(),
                    )
                })?;
                fetcher(self.page_ref)?
            }
        };

        let mut dict = match page_obj {
            PDFObject::Dictionary(d) => d,
            other => {
                return Err(PDFError::InvalidObject {
                    expected: "Dictionary".into(),
                    found: format!("{other:?}"),
                });
            }
        };

        self.original_rotation = dict.get("Rotate").and_then(PDFObject::as_i64);
        dict.insert("Rotate".to_string(), PDFObject::Integer(self.degrees));
        delta.modify_object(self.page_ref, PDFObject::Dictionary(dict));
        Ok(())
    }

    fn undo(&mut self, delta: &mut DeltaLayer) -> PDFResult<()> {
        let delta_obj = delta
            .get(&self.page_ref)
            .ok_or_else(|| PDFError::Generic("page object missing from delta during undo".into()))?;
        let mut dict = match &delta_obj.object {
            PDFObject::Dictionary(d) => d.clone(),
            other => {
                return Err(PDFError::InvalidObject {
                    expected: "Dictionary".into(),
                    found: format!("{other:?}"),
                });
            }
        };

        match self.original_rotation {
            Some(original) => {
                dict.insert("Rotate".to_string(), PDFObject::Integer(original));
            }
            None => {
                dict.remove("Rotate");
            }
        }
        delta.modify_object(self.page_ref, PDFObject::Dictionary(dict));
        Ok(())
    }

    fn redo(&mut self, delta: &mut DeltaLayer) -> PDFResult<()> {
        let delta_obj = delta
            .get(&self.page_ref)
            .ok_or_else(|| PDFError::Generic("page object missing from delta during redo".into()))?;
        let mut dict = match &delta_obj.object {
            PDFObject::Dictionary(d) => d.clone(),
            other => {
                return Err(PDFError::InvalidObject {
                    expected: "Dictionary".into(),
                    found: format!("{other:?}"),
                });
            }
        };
        dict.insert("Rotate".to_string(), PDFObject::Integer(self.degrees));
        delta.modify_object(self.page_ref, PDFObject::Dictionary(dict));
        Ok(())
    }
}

/// Appends a brand-new leaf page to a `/Pages` node, updating its `/Kids`
/// and `/Count`. Spec's `AppendPage(page)` mutation kind.
#[derive(Debug)]
pub struct AppendPageCommand {
    pages_ref: Ref,
    media_box: [f64; 4],
    contents: Vec<u8>,
    before_pages_dict: Option<PDFObject>,
    after_pages_dict: Option<PDFObject>,
}

impl AppendPageCommand {
    pub fn new(pages_ref: Ref, media_box: [f64; 4], contents: Vec<u8>) -> Self {
        Self {
            pages_ref,
            media_box,
            contents,
            before_pages_dict: None,
            after_pages_dict: None,
        }
    }
}

impl Command for AppendPageCommand {
    fn execute<'a>(
        &mut self,
        delta: &mut DeltaLayer,
        fetch_base: Option<&'a BaseObjectFetcher<'a>>,
    ) -> PDFResult<()> {
        let pages_obj = match delta.get(&self.pages_ref) {
            Some(delta_obj) => delta_obj.object.clone(),
            None => {
                let fetcher = fetch_base.ok_or_else(|| {
                    PDFError::Generic("cannot fetch base Pages object without a fetch callback".into())
                })?;
                fetcher(self.pages_ref)?
            }
        };
        let mut pages_dict = match pages_obj {
            PDFObject::Dictionary(d) => d,
            other => {
                return Err(PDFError::InvalidObject {
                    expected: "Dictionary".into(),
                    found: format!("{other:?}"),
                });
            }
        };
        self.before_pages_dict = Some(PDFObject::Dictionary(pages_dict.clone()));

        let mut content_dict = HashMap::new();
        content_dict.insert("Length".to_string(), PDFObject::Integer(self.contents.len() as i64));
        let content_ref = delta.add_object(PDFObject::Stream {
            dict: content_dict,
            data: self.contents.clone(),
        });

        let media_box: smallvec::SmallVec<[Box<PDFObject>; 4]> =
            self.media_box.iter().map(|n| Box::new(PDFObject::Real(*n))).collect();

        let mut page_dict = HashMap::new();
        page_dict.insert("Type".to_string(), PDFObject::Name("Page".to_string()));
        page_dict.insert("Parent".to_string(), PDFObject::Ref(self.pages_ref));
        page_dict.insert("MediaBox".to_string(), PDFObject::Array(media_box));
        page_dict.insert("Contents".to_string(), PDFObject::Ref(content_ref));
        page_dict.insert("Resources".to_string(), PDFObject::Dictionary(HashMap::new()));
        let page_ref = delta.add_object(PDFObject::Dictionary(page_dict));

        let mut kids = match pages_dict.get("Kids") {
            Some(PDFObject::Array(arr)) => arr.clone(),
            _ => smallvec::SmallVec::new(),
        };
        kids.push(Box::new(PDFObject::Ref(page_ref)));
        let count = kids.len() as i64;
        pages_dict.insert("Kids".to_string(), PDFObject::Array(kids));
        pages_dict.insert("Count".to_string(), PDFObject::Integer(count));

        let after = PDFObject::Dictionary(pages_dict);
        self.after_pages_dict = Some(after.clone());
        delta.modify_object(self.pages_ref, after);
        Ok(())
    }

    fn undo(&mut self, delta: &mut DeltaLayer) -> PDFResult<()> {
        let before = self
            .before_pages_dict
            .clone()
            .ok_or_else(|| PDFError::Generic("nothing to undo".into()))?;
        delta.modify_object(self.pages_ref, before);
        Ok(())
    }

    fn redo(&mut self, delta: &mut DeltaLayer) -> PDFResult<()> {
        let after = self
            .after_pages_dict
            .clone()
            .ok_or_else(|| PDFError::Generic("nothing to redo".into()))?;
        delta.modify_object(self.pages_ref, after);
        Ok(())
    }
}

/// Replaces a page's `/Contents` with a new content stream, leaving the
/// rest of its dictionary untouched. Spec's `ModifyPage(index)` mutation
/// kind — the builder reuses the page's object id rather than allocating a
/// new one, only the content stream it points at changes.
#[derive(Debug)]
pub struct ReplaceContentsCommand {
    page_ref: Ref,
    new_contents: Vec<u8>,
    before_page_dict: Option<PDFObject>,
    after_page_dict: Option<PDFObject>,
}

impl ReplaceContentsCommand {
    pub fn new(page_ref: Ref, new_contents: Vec<u8>) -> Self {
        Self {
            page_ref,
            new_contents,
            before_page_dict: None,
            after_page_dict: None,
        }
    }
}

impl Command for ReplaceContentsCommand {
    fn execute<'a>(
        &mut self,
        delta: &mut DeltaLayer,
        fetch_base: Option<&'a BaseObjectFetcher<'a>>,
    ) -> PDFResult<()> {
        let page_obj = match delta.get(&self.page_ref) {
            Some(delta_obj) => delta_obj.object.clone(),
            None => {
                let fetcher = fetch_base.ok_or_else(|| {
                    PDFError::Generic("cannot fetch base page object without a fetch callback".into())
                })?;
                fetcher(self.page_ref)?
            }
        };
        let mut dict = match page_obj {
            PDFObject::Dictionary(d) => d,
            other => {
                return Err(PDFError::InvalidObject {
                    expected: "Dictionary".into(),
                    found: format!("{other:?}"),
                });
            }
        };
        self.before_page_dict = Some(PDFObject::Dictionary(dict.clone()));

        let mut stream_dict = HashMap::new();
        stream_dict.insert("Length".to_string(), PDFObject::Integer(self.new_contents.len() as i64));
        let content_ref = delta.add_object(PDFObject::Stream {
            dict: stream_dict,
            data: self.new_contents.clone(),
        });
        dict.insert("Contents".to_string(), PDFObject::Ref(content_ref));

        let after = PDFObject::Dictionary(dict);
        self.after_page_dict = Some(after.clone());
        delta.modify_object(self.page_ref, after);
        Ok(())
    }

    fn undo(&mut self, delta: &mut DeltaLayer) -> PDFResult<()> {
        let before = self
            .before_page_dict
            .clone()
            .ok_or_else(|| PDFError::Generic("nothing to undo".into()))?;
        delta.modify_object(self.page_ref, before);
        Ok(())
    }

    fn redo(&mut self, delta: &mut DeltaLayer) -> PDFResult<()> {
        let after = self
            .after_page_dict
            .clone()
            .ok_or_else(|| PDFError::Generic("nothing to redo".into()))?;
        delta.modify_object(self.page_ref, after);
        Ok(())
    }
}
