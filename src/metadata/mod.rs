//! Per-record metadata table
//!
//! Unlike vectorization, metadata is assembled into a positional list:
//! row i of a split's metadata must describe the same record as row i of
//! that split's feature matrix. Workers may finish in any order, so results
//! are placed by their task index rather than appended on completion.

pub mod csv;

use serde::Deserialize;
use tracing::info;

use crate::dataset::{DataLayout, Split};
use crate::pipeline::{TaskPool, DEFAULT_QUEUE_DEPTH};
use crate::record::RawRecordStream;
use crate::utils::{Result, VectorizeError};

pub use self::csv::{read_metadata, write_metadata};

/// Metadata fields of one raw record; absent keys stay `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetadataRecord {
    #[serde(rename = "sha256", default)]
    pub identifier: Option<String>,

    #[serde(default)]
    pub appeared: Option<String>,

    #[serde(default)]
    pub label: Option<i64>,

    #[serde(rename = "avclass", default)]
    pub family: Option<String>,
}

impl MetadataRecord {
    /// Decode only the metadata keys of a raw line
    pub fn decode(line: impl AsRef<[u8]>) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_slice(line.as_ref())
    }
}

/// Metadata record tagged with its split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub split: Split,
    pub record: MetadataRecord,
}

/// Metadata table column, in output priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MetadataColumn {
    Sha256,
    Appeared,
    Subset,
    Label,
    Avclass,
}

impl MetadataColumn {
    pub const ALL: [MetadataColumn; 5] = [
        MetadataColumn::Sha256,
        MetadataColumn::Appeared,
        MetadataColumn::Subset,
        MetadataColumn::Label,
        MetadataColumn::Avclass,
    ];

    /// Column header
    pub fn name(&self) -> &'static str {
        match self {
            MetadataColumn::Sha256 => "sha256",
            MetadataColumn::Appeared => "appeared",
            MetadataColumn::Subset => "subset",
            MetadataColumn::Label => "label",
            MetadataColumn::Avclass => "avclass",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Whether `record` carries a value for this column
    fn present_in(&self, record: &MetadataRecord) -> bool {
        match self {
            MetadataColumn::Sha256 => record.identifier.is_some(),
            MetadataColumn::Appeared => record.appeared.is_some(),
            MetadataColumn::Subset => true,
            MetadataColumn::Label => record.label.is_some(),
            MetadataColumn::Avclass => record.family.is_some(),
        }
    }

    /// Cell value for a row, empty when missing
    pub fn value(&self, row: &MetadataRow) -> String {
        match self {
            MetadataColumn::Sha256 => row.record.identifier.clone().unwrap_or_default(),
            MetadataColumn::Appeared => row.record.appeared.clone().unwrap_or_default(),
            MetadataColumn::Subset => row.split.as_str().to_string(),
            MetadataColumn::Label => row.record.label.map(|l| l.to_string()).unwrap_or_default(),
            MetadataColumn::Avclass => row.record.family.clone().unwrap_or_default(),
        }
    }
}

/// Metadata for every record of both splits, train rows first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTable {
    pub columns: Vec<MetadataColumn>,
    pub rows: Vec<MetadataRow>,
}

impl MetadataTable {
    /// Build a table whose columns are those present in the first row
    pub fn from_rows(rows: Vec<MetadataRow>) -> Self {
        let columns = match rows.first() {
            Some(first) => MetadataColumn::ALL
                .into_iter()
                .filter(|c| c.present_in(&first.record))
                .collect(),
            None => vec![MetadataColumn::Subset],
        };
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one split, in feature-matrix order
    pub fn split_rows(&self, split: Split) -> impl Iterator<Item = &MetadataRow> + '_ {
        self.rows.iter().filter(move |r| r.split == split)
    }
}

/// Decode the metadata of one split, preserving input order
pub fn read_split_metadata(
    stream: &RawRecordStream,
    split: Split,
    threads: usize,
    show_progress: bool,
) -> Result<Vec<MetadataRecord>> {
    let pool = TaskPool::new(threads)
        .with_queue_depth(DEFAULT_QUEUE_DEPTH)
        .with_progress(show_progress);

    let tasks = stream
        .iter()
        .enumerate()
        .map(|(row, line)| line.map(|line| (row as u64, line)));

    // The total only drives the progress bar
    let total = if show_progress { stream.count()? } else { 0 };
    let report = pool.run(split.as_str(), total, tasks, |_, queue| {
        let mut decoded = Vec::new();
        while let Some((row, line)) = queue.next_task() {
            let record = MetadataRecord::decode(&line).map_err(|e| VectorizeError::Decode {
                split,
                row,
                reason: e.to_string(),
            })?;
            decoded.push((row, record));
            queue.counters().record_finished(1);
        }
        Ok(decoded)
    })?;

    let mut slots: Vec<Option<MetadataRecord>> = vec![None; report.issued as usize];
    for (row, record) in report.outputs.into_iter().flatten() {
        let slot = slots
            .get_mut(row as usize)
            .ok_or(VectorizeError::RowIndexOutOfRange {
                split,
                row,
                rows: report.issued,
            })?;
        *slot = Some(record);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(row, record)| {
            record.ok_or_else(|| {
                VectorizeError::Metadata(format!("{} row {} was never decoded", split, row))
            })
        })
        .collect()
}

/// Build the metadata table for both splits and write it to `metadata.csv`
pub fn create_metadata(layout: &DataLayout, threads: usize, show_progress: bool) -> Result<MetadataTable> {
    let mut rows = Vec::new();
    for split in Split::ALL {
        let stream = RawRecordStream::new(layout.raw_feature_paths(split));
        let records = read_split_metadata(&stream, split, threads, show_progress)?;
        info!("Read metadata for {} {} records", records.len(), split);
        rows.extend(records.into_iter().map(|record| MetadataRow { split, record }));
    }

    let table = MetadataTable::from_rows(rows);
    write_metadata(layout.metadata_path(), &table)?;
    info!("Wrote {:?} ({} rows)", layout.metadata_path(), table.len());
    Ok(table)
}
