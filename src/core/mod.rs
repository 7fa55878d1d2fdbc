pub mod base_stream;
pub mod crypto;
pub mod decode;
pub mod delta;
pub mod document;
pub mod encryption;
pub mod error;
pub mod lexer;
pub mod page;
pub mod parser;
pub mod pdf_writer;
pub mod stream;
pub mod sub_stream;
pub mod xref;

pub use base_stream::BaseStream;
pub use delta::{AppendPageCommand, Command, DeltaLayer, ReplaceContentsCommand, RotatePageCommand};
pub use document::{LinearizedInfo, PDFDocument};
pub use encryption::{DecryptionHelper, EncryptDict, EncryptionAlgorithm, EncryptionVersion, PDFPermissions};
pub use error::{PDFError, PDFResult};
pub use lexer::{Lexer, Token};
pub use page::{Page, PageTreeCache};
pub use parser::{DecryptionHook, PDFObject, Parser, Ref};
pub use pdf_writer::{DictionaryContext, PDFWriter};
pub use stream::Stream;
pub use sub_stream::SubStream;
pub use xref::{XRef, XRefEntry};
