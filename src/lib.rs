pub mod copy;
pub mod core;
pub mod incremental;

// Re-export main types for convenience
pub use core::{
    AppendPageCommand, BaseStream, Command, DecryptionHelper, DeltaLayer, DictionaryContext,
    EncryptDict, EncryptionAlgorithm, EncryptionVersion, Lexer, Page, PageTreeCache, PDFDocument,
    PDFError, PDFObject, PDFPermissions, PDFResult, PDFWriter, Parser, ReplaceContentsCommand,
    RotatePageCommand, Stream, SubStream, Token, XRef, XRefEntry,
};
