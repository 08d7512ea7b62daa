use std::path::Path;

use tracing::debug;

use crate::errors::{ParserError, Rejection, Rejections};
use crate::formats::{DelimitedReader, DocxReader};
use crate::model::TableDocument;

/// A document format that can be turned into tables.
///
/// A reader that does not recognise the bytes must answer
/// [`ParserError::FormatMismatch`] so the next reader gets a turn; any other
/// error means the document was recognised but is broken.
pub trait DocumentReader: Sync {
    fn name(&self) -> &'static str;
    fn read(&self, contents: &[u8]) -> Result<TableDocument, ParserError>;
}

/// Readers tried by [`read_document`], most specific first.
pub static STANDARD_READERS: [&dyn DocumentReader; 2] = [&DocxReader, &DelimitedReader];

pub fn read_document(contents: &[u8]) -> Result<TableDocument, ParserError> {
    read_with(&STANDARD_READERS, contents)
}

pub fn read_document_path(path: &Path) -> Result<TableDocument, ParserError> {
    read_document(&std::fs::read(path)?)
}

pub fn read_with(
    readers: &[&dyn DocumentReader],
    contents: &[u8],
) -> Result<TableDocument, ParserError> {
    let mut rejections = Vec::with_capacity(readers.len());

    for reader in readers {
        let reason = match reader.read(contents) {
            Err(ParserError::FormatMismatch { reason, .. }) => reason,
            outcome => return outcome,
        };
        debug!(reader = reader.name(), %reason, "reader declined document");
        rejections.push(Rejection {
            reader: reader.name(),
            reason,
        });
    }

    Err(ParserError::UnknownFormat(Rejections(rejections)))
}
