use std::io::{Cursor, Read};

use ::zip::result::ZipError;
use ::zip::ZipArchive;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::ParserError;
use crate::model::{Table, TableDocument};
use crate::registry::DocumentReader;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the top-level tables of a WordprocessingML (`.docx`) document.
pub struct DocxReader;

impl Default for DocxReader {
    fn default() -> Self {
        Self
    }
}

impl DocxReader {
    const NAME: &'static str = "DOCX";

    fn document_xml(contents: &[u8]) -> Result<String, ParserError> {
        let mut archive =
            ZipArchive::new(Cursor::new(contents)).map_err(|source| ParserError::Zip {
                reader: Self::NAME,
                source,
            })?;

        let mut part = archive.by_name(DOCUMENT_PART).map_err(|err| match err {
            ZipError::FileNotFound => ParserError::MissingPart {
                reader: Self::NAME,
                part: DOCUMENT_PART,
            },
            source => ParserError::Zip {
                reader: Self::NAME,
                source,
            },
        })?;

        let mut xml = String::new();
        part.read_to_string(&mut xml)?;
        Ok(xml)
    }
}

impl DocumentReader for DocxReader {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn read(&self, contents: &[u8]) -> Result<TableDocument, ParserError> {
        if !contents.starts_with(ZIP_MAGIC) {
            return Err(ParserError::FormatMismatch {
                reader: Self::NAME,
                reason: "content is not a zip container".to_string(),
            });
        }
        let xml = Self::document_xml(contents)?;
        collect_tables(&xml)
    }
}

#[derive(Default)]
struct CellState {
    text: String,
    paragraphs: usize,
    span: usize,
    continues_merge: bool,
}

#[derive(Default)]
struct RowState {
    cells: Vec<String>,
    grid: Vec<String>,
}

impl RowState {
    fn push_cell(&mut self, cell: CellState, above: &[String]) {
        let column = self.grid.len();
        let text = if cell.continues_merge {
            above.get(column).cloned().unwrap_or_default()
        } else {
            cell.text
        };
        for _ in 0..cell.span.max(1) {
            self.cells.push(text.clone());
            self.grid.push(text.clone());
        }
    }
}

#[derive(Default)]
struct TableCollector {
    tables: Vec<Table>,
    depth: usize,
    rows: Vec<Vec<String>>,
    above: Vec<String>,
    row: Option<RowState>,
    cell: Option<CellState>,
    in_run: bool,
    in_text: bool,
}

impl TableCollector {
    fn at_top_level(&self) -> bool {
        self.depth == 1
    }

    fn cell_mut(&mut self) -> Option<&mut CellState> {
        if self.at_top_level() {
            self.cell.as_mut()
        } else {
            None
        }
    }

    fn open(&mut self, element: &BytesStart<'_>, position: u64) -> Result<(), ParserError> {
        match element.name().as_ref() {
            b"w:tbl" => {
                self.depth += 1;
                if self.at_top_level() {
                    self.rows.clear();
                    self.above.clear();
                }
            }
            b"w:tr" if self.at_top_level() => self.row = Some(RowState::default()),
            b"w:tc" if self.at_top_level() => {
                self.cell = Some(CellState {
                    span: 1,
                    ..CellState::default()
                })
            }
            b"w:p" => {
                if let Some(cell) = self.cell_mut() {
                    if cell.paragraphs > 0 {
                        cell.text.push('\n');
                    }
                    cell.paragraphs += 1;
                }
            }
            b"w:r" => self.in_run = true,
            b"w:t" => self.in_text = self.cell_mut().is_some(),
            _ => self.property(element, position)?,
        }
        Ok(())
    }

    fn property(&mut self, element: &BytesStart<'_>, position: u64) -> Result<(), ParserError> {
        let in_run = self.in_run;
        let Some(cell) = self.cell_mut() else {
            return Ok(());
        };
        match element.name().as_ref() {
            b"w:gridSpan" => {
                cell.span = attribute(element, "w:val", position)?
                    .and_then(|value| value.parse::<usize>().ok())
                    .filter(|span| *span > 0)
                    .unwrap_or(1);
            }
            b"w:vMerge" => {
                let value = attribute(element, "w:val", position)?;
                cell.continues_merge = !matches!(value.as_deref(), Some("restart"));
            }
            b"w:tab" if in_run => cell.text.push('\t'),
            b"w:br" | b"w:cr" if in_run => cell.text.push('\n'),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"w:tbl" => {
                if self.at_top_level() {
                    self.tables.push(Table::new(std::mem::take(&mut self.rows)));
                }
                self.depth = self.depth.saturating_sub(1);
            }
            b"w:tr" if self.at_top_level() => {
                if let Some(row) = self.row.take() {
                    self.rows.push(row.cells);
                    self.above = row.grid;
                }
            }
            b"w:tc" if self.at_top_level() => {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    row.push_cell(cell, &self.above);
                }
            }
            b"w:r" => self.in_run = false,
            b"w:t" => self.in_text = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if !self.in_text {
            return;
        }
        if let Some(cell) = self.cell_mut() {
            cell.text.push_str(text);
        }
    }
}

fn attribute(
    element: &BytesStart<'_>,
    name: &str,
    position: u64,
) -> Result<Option<String>, ParserError> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|err| xml_error(position, err))?;
    match attr {
        Some(attr) => {
            let value = attr
                .unescape_value()
                .map_err(|err| xml_error(position, err))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

fn xml_error(position: u64, err: impl std::fmt::Display) -> ParserError {
    ParserError::Xml {
        reader: DocxReader::NAME,
        position,
        message: err.to_string(),
    }
}

pub(crate) fn collect_tables(xml: &str) -> Result<TableDocument, ParserError> {
    let mut reader = Reader::from_str(xml);
    let mut collector = TableCollector::default();

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_event() {
            Ok(Event::Start(element)) => collector.open(&element, position)?,
            Ok(Event::Empty(element)) => {
                collector.open(&element, position)?;
                collector.close(element.name().as_ref());
            }
            Ok(Event::End(element)) => collector.close(element.name().as_ref()),
            Ok(Event::Text(text)) => {
                let text = text.unescape().map_err(|err| xml_error(position, err))?;
                collector.text(&text);
            }
            Ok(Event::CData(data)) => {
                let bytes = data.into_inner();
                collector.text(&String::from_utf8_lossy(&bytes));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(xml_error(position, err)),
        }
    }

    Ok(TableDocument::new(collector.tables))
}
