use crate::errors::ParserError;
use crate::model::{Table, TableDocument};
use crate::registry::DocumentReader;

/// Reads CSV or TSV text as a single table.
pub struct DelimitedReader;

impl Default for DelimitedReader {
    fn default() -> Self {
        Self
    }
}

impl DelimitedReader {
    const NAME: &'static str = "DELIMITED";

    fn sniff_delimiter(text: &str) -> u8 {
        match text.lines().next() {
            Some(first) if first.contains('\t') => b'\t',
            _ => b',',
        }
    }
}

impl DocumentReader for DelimitedReader {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn read(&self, contents: &[u8]) -> Result<TableDocument, ParserError> {
        let text = std::str::from_utf8(contents).map_err(|err| ParserError::FormatMismatch {
            reader: Self::NAME,
            reason: format!("content is not valid UTF-8: {err}"),
        })?;
        if text.contains('\0') {
            return Err(ParserError::FormatMismatch {
                reader: Self::NAME,
                reason: "content contains NUL bytes".to_string(),
            });
        }
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(Self::sniff_delimiter(text))
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| ParserError::Csv {
                reader: Self::NAME,
                source,
            })?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if rows.is_empty() {
            return Ok(TableDocument::default());
        }
        Ok(TableDocument::new(vec![Table::new(rows)]))
    }
}
