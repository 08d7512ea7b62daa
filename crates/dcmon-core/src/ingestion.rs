use std::io::Write;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use dcmon_parser::{
    build_record, extract_cells, read_document, read_document_path, TableDocument, TimeSeriesRecord,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{DashboardError, Result};

const UPLOAD_PREFIX: &str = "dcmon-upload-";

#[derive(Debug)]
pub struct DocumentInput<'a> {
    pub name: &'a str,
    pub contents: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentStatus {
    Parsed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub name: String,
    pub hash: String,
    pub status: DocumentStatus,
    pub table_count: usize,
    pub message: Option<String>,
}

#[derive(Debug)]
pub struct IngestionBatch {
    pub record: TimeSeriesRecord,
    pub cells: Vec<String>,
    pub reports: Vec<DocumentReport>,
}

impl IngestionBatch {
    /// Reports of documents that were skipped.
    pub fn warnings(&self) -> impl Iterator<Item = &DocumentReport> {
        self.reports
            .iter()
            .filter(|report| report.status == DocumentStatus::Failed)
    }
}

/// Extracts one record from uploaded document bytes.
///
/// Each upload is staged in its own temporary file for the reader and the
/// file is removed when the staging handle drops, whether or not reading
/// succeeded. Unreadable documents are logged and reported, never fatal.
pub fn ingest_documents(inputs: &[DocumentInput<'_>]) -> Result<IngestionBatch> {
    let mut documents = Vec::new();
    let mut reports = Vec::new();

    for input in inputs {
        let hash = compute_hash(input.contents);
        let outcome = stage_and_read(input);
        record_outcome(input.name, hash, outcome, &mut documents, &mut reports);
    }

    finish(&documents, reports)
}

/// Same as [`ingest_documents`] for files already on disk. Each file is read
/// once; the hash and the parse share the same bytes.
pub fn ingest_paths(paths: &[PathBuf]) -> Result<IngestionBatch> {
    let mut documents = Vec::new();
    let mut reports = Vec::new();

    for path in paths {
        let name = path.display().to_string();
        let (hash, outcome): (String, Result<TableDocument>) = match std::fs::read(path) {
            Ok(contents) => (compute_hash(&contents), read_document(&contents).map_err(Into::into)),
            Err(err) => (String::new(), Err(DashboardError::Io(err))),
        };
        record_outcome(&name, hash, outcome, &mut documents, &mut reports);
    }

    finish(&documents, reports)
}

/// Cache key for a batch: the ordered content hashes of its documents.
pub fn batch_key(inputs: &[DocumentInput<'_>]) -> String {
    let mut hasher = Hasher::new();
    for input in inputs {
        hasher.update(compute_hash(input.contents).as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

pub fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    let hash = hasher.finalize();
    hash.to_hex().to_string()
}

fn stage_and_read(input: &DocumentInput<'_>) -> Result<TableDocument> {
    let suffix = Path::new(input.name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut staged = tempfile::Builder::new()
        .prefix(UPLOAD_PREFIX)
        .suffix(&suffix)
        .tempfile()?;
    staged.write_all(input.contents)?;
    staged.flush()?;
    debug!(name = input.name, path = %staged.path().display(), "staged upload");

    let document = read_document_path(staged.path())?;
    Ok(document)
}

fn record_outcome(
    name: &str,
    hash: String,
    outcome: Result<TableDocument>,
    documents: &mut Vec<TableDocument>,
    reports: &mut Vec<DocumentReport>,
) {
    match outcome {
        Ok(document) => {
            reports.push(DocumentReport {
                name: name.to_string(),
                hash,
                status: DocumentStatus::Parsed,
                table_count: document.tables.len(),
                message: None,
            });
            documents.push(document);
        }
        Err(err) => {
            warn!(document = name, error = %err, "skipping unreadable document");
            reports.push(DocumentReport {
                name: name.to_string(),
                hash,
                status: DocumentStatus::Failed,
                table_count: 0,
                message: Some(err.to_string()),
            });
        }
    }
}

fn finish(documents: &[TableDocument], reports: Vec<DocumentReport>) -> Result<IngestionBatch> {
    let cells = extract_cells(documents);
    if cells.is_empty() {
        return Err(DashboardError::NoData(format!(
            "no table cells found in {} document(s)",
            reports.len()
        )));
    }

    let record = build_record(&cells);
    info!(
        documents = reports.len(),
        cells = cells.len(),
        dates = record.dates.len(),
        aligned = record.is_aligned(),
        "extracted time series from documents"
    );

    Ok(IngestionBatch {
        record,
        cells,
        reports,
    })
}
