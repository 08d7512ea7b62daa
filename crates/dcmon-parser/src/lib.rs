pub mod builder;
pub mod cells;
pub mod errors;
pub mod formats;
pub mod model;
mod registry;
pub mod vocabulary;

pub use builder::{build_record, build_record_with};
pub use cells::{clean_cells, extract_cells, flatten_tables};
pub use errors::{ParserError, Rejection, Rejections};
pub use model::{Metric, Table, TableDocument, TimeSeriesRecord, Zone, ZoneSeries};
pub use registry::{read_document, read_document_path, read_with, DocumentReader, STANDARD_READERS};
pub use vocabulary::{FieldRule, FieldValue, FieldVocabulary, RuleKind, ScalarField};

#[cfg(test)]
mod tests;
