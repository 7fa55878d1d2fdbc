use super::base_stream::BaseStream;
use super::error::{PDFError, PDFResult};
use std::sync::{Arc, Mutex};

/// A sub-stream that provides a restricted view into a parent stream.
///
/// Used to compose filter pipelines (§4.1): each filter stage wraps an
/// arbitrary inner reader without copying its bytes. Also backs object
/// streams, content streams and stream descriptors produced by the parser.
///
/// The sub-stream shares data with the parent stream (no copying) and maintains
/// its own position within the restricted range.
pub struct SubStream {
    /// Reference to the parent stream (shared ownership with interior mutability)
    parent: Arc<Mutex<Box<dyn BaseStream>>>,
    /// Absolute starting position in the parent stream
    start: usize,
    /// Length of this sub-stream
    length: usize,
    /// Current position relative to start (0 = start of sub-stream)
    pos: usize,
}

impl SubStream {
    /// Creates a new sub-stream from a parent stream.
    pub fn new(parent: Box<dyn BaseStream>, start: usize, length: usize) -> PDFResult<Self> {
        if start + length > parent.length() {
            return Err(PDFError::InvalidByteRange {
                begin: start,
                end: start + length,
            });
        }

        Ok(SubStream {
            parent: Arc::new(Mutex::new(parent)),
            start,
            length,
            pos: 0,
        })
    }

    /// Creates a sub-stream from an existing Arc<Mutex<>> parent.
    ///
    /// Used for sub-streams of sub-streams without nesting mutex locks.
    pub fn from_shared(
        parent: Arc<Mutex<Box<dyn BaseStream>>>,
        start: usize,
        length: usize,
    ) -> PDFResult<Self> {
        let parent_length = parent.lock().unwrap().length();
        if start + length > parent_length {
            return Err(PDFError::InvalidByteRange {
                begin: start,
                end: start + length,
            });
        }

        Ok(SubStream {
            parent,
            start,
            length,
            pos: 0,
        })
    }

    fn absolute_pos(&self) -> usize {
        self.start + self.pos
    }
}

impl BaseStream for SubStream {
    fn length(&self) -> usize {
        self.length
    }

    fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn set_pos(&mut self, pos: usize) -> PDFResult<()> {
        if pos > self.length {
            return Err(PDFError::InvalidPosition {
                pos,
                length: self.length,
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn is_data_loaded(&self) -> bool {
        let parent = self.parent.lock().unwrap();
        parent.is_data_loaded()
    }

    fn get_byte(&mut self) -> PDFResult<u8> {
        if self.pos >= self.length {
            return Err(PDFError::UnexpectedEndOfStream);
        }

        let abs_pos = self.absolute_pos();
        let mut parent = self.parent.lock().unwrap();

        parent.set_pos(abs_pos)?;
        let byte = parent.get_byte()?;

        self.pos += 1;
        Ok(byte)
    }

    fn get_bytes(&mut self, length: usize) -> PDFResult<Vec<u8>> {
        let actual_length = std::cmp::min(length, self.length - self.pos);

        if actual_length == 0 {
            return Ok(Vec::new());
        }

        let abs_pos = self.absolute_pos();
        let mut parent = self.parent.lock().unwrap();

        parent.set_pos(abs_pos)?;
        let bytes = parent.get_bytes(actual_length)?;

        self.pos += bytes.len();
        Ok(bytes)
    }

    fn get_byte_range(&self, begin: usize, end: usize) -> PDFResult<Vec<u8>> {
        if begin >= end {
            return Err(PDFError::InvalidByteRange { begin, end });
        }

        if end > self.length {
            return Err(PDFError::InvalidByteRange { begin, end });
        }

        let abs_begin = self.start + begin;
        let abs_end = self.start + end;

        let parent = self.parent.lock().unwrap();
        parent.get_byte_range(abs_begin, abs_end)
    }

    fn reset(&mut self) -> PDFResult<()> {
        self.pos = 0;
        Ok(())
    }

    fn move_start(&mut self) -> PDFResult<()> {
        if self.pos > 0 {
            self.start += self.pos;
            self.length = self.length.saturating_sub(self.pos);
            self.pos = 0;
        }
        Ok(())
    }

    fn make_sub_stream(&self, start: usize, length: usize) -> PDFResult<Box<dyn BaseStream>> {
        if start + length > self.length {
            return Err(PDFError::InvalidByteRange {
                begin: start,
                end: start + length,
            });
        }

        let abs_start = self.start + start;
        let sub = SubStream::from_shared(Arc::clone(&self.parent), abs_start, length)?;

        Ok(Box::new(sub))
    }

    fn get_base_streams(&self) -> Option<Vec<Box<dyn BaseStream>>> {
        let parent = self.parent.lock().unwrap();
        parent.get_base_streams()
    }

    fn get_original_stream(&self) -> Option<&dyn BaseStream> {
        // Can't hand back a reference through the mutex; rarely needed.
        None
    }
}
