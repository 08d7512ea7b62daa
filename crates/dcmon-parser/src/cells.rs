use crate::model::TableDocument;

/// Walks documents, then tables, then rows, then cells, keeping cell text verbatim.
pub fn flatten_tables(documents: &[TableDocument]) -> Vec<String> {
    let capacity = documents.iter().map(TableDocument::cell_count).sum();
    let mut cells = Vec::with_capacity(capacity);
    for document in documents {
        for table in &document.tables {
            for row in &table.rows {
                cells.extend(row.iter().cloned());
            }
        }
    }
    cells
}

/// Drops empty cells and collapses adjacent duplicates.
///
/// Of two equal neighbours the earlier one is removed, so `["A", "A", "B"]`
/// keeps the second `"A"`. Empty cells are removed before collapsing; the
/// result never holds two equal neighbours and cleaning it again is a no-op.
pub fn clean_cells(cells: Vec<String>) -> Vec<String> {
    let cells: Vec<String> = cells.into_iter().filter(|cell| !cell.is_empty()).collect();

    let keep: Vec<bool> = (0..cells.len())
        .map(|idx| cells.get(idx + 1) != Some(&cells[idx]))
        .collect();

    cells
        .into_iter()
        .zip(keep)
        .filter_map(|(cell, keep)| keep.then_some(cell))
        .collect()
}

pub fn extract_cells(documents: &[TableDocument]) -> Vec<String> {
    clean_cells(flatten_tables(documents))
}
