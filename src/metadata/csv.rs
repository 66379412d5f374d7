//! Metadata CSV encoding
//!
//! The table is written with an unnamed leading index column, matching what
//! dataframe tooling produces and expects when reading it back.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::{MetadataColumn, MetadataRecord, MetadataRow, MetadataTable};
use crate::dataset::Split;
use crate::utils::{Result, VectorizeError};

/// Quote a cell if it contains a delimiter, quote or line break
fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Split one CSV line into cells, honoring double-quoted cells
fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if cell.is_empty() => in_quotes = true,
            (',', false) => cells.push(std::mem::take(&mut cell)),
            (c, _) => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

/// Write the table to `path`
pub fn write_metadata<P: AsRef<Path>>(path: P, table: &MetadataTable) -> Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);

    let header: Vec<&str> = table.columns.iter().map(|c| c.name()).collect();
    writeln!(out, ",{}", header.join(","))?;

    for (idx, row) in table.rows.iter().enumerate() {
        let cells: Vec<String> = table
            .columns
            .iter()
            .map(|c| escape(&c.value(row)))
            .collect();
        writeln!(out, "{},{}", idx, cells.join(","))?;
    }

    out.flush()?;
    Ok(())
}

/// Read a table written by [`write_metadata`]
pub fn read_metadata<P: AsRef<Path>>(path: P) -> Result<MetadataTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| VectorizeError::InputFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(VectorizeError::Metadata(format!("{:?} is empty", path))),
    };
    let columns = split_line(&header)
        .into_iter()
        .skip(1)
        .map(|name| {
            MetadataColumn::parse(&name)
                .ok_or_else(|| VectorizeError::Metadata(format!("unknown column '{}'", name)))
        })
        .collect::<Result<Vec<_>>>()?;
    if !columns.contains(&MetadataColumn::Subset) {
        return Err(VectorizeError::Metadata("missing 'subset' column".to_string()));
    }

    let mut rows = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let cells = split_line(&line);
        if cells.len() != columns.len() + 1 {
            return Err(VectorizeError::Metadata(format!(
                "line {} has {} cells, expected {}",
                line_no + 2,
                cells.len(),
                columns.len() + 1
            )));
        }

        let mut split = Split::Train;
        let mut record = MetadataRecord::default();
        for (column, cell) in columns.iter().zip(cells.into_iter().skip(1)) {
            let value = if cell.is_empty() { None } else { Some(cell) };
            match column {
                MetadataColumn::Sha256 => record.identifier = value,
                MetadataColumn::Appeared => record.appeared = value,
                MetadataColumn::Avclass => record.family = value,
                MetadataColumn::Subset => {
                    split = Split::parse(value.as_deref().unwrap_or_default())?;
                }
                MetadataColumn::Label => {
                    record.label = value
                        .map(|v| {
                            v.parse::<i64>().map_err(|_| {
                                VectorizeError::Metadata(format!("invalid label '{}'", v))
                            })
                        })
                        .transpose()?;
                }
            }
        }
        rows.push(MetadataRow { split, record });
    }

    Ok(MetadataTable { columns, rows })
}
