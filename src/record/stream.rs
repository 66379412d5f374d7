//! Line stream over an ordered list of input files
//!
//! The pipeline scans its inputs twice (count, then vectorize), so the
//! stream only holds the file list and every call to [`RawRecordStream::iter`]
//! starts again from the first file.
//!
//! Lines are yielded as raw bytes. Text validation belongs to record
//! decoding, where a bad line can be reported with its row index.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::utils::{Result, VectorizeError};

/// Restartable sequence of raw record lines
#[derive(Debug, Clone)]
pub struct RawRecordStream {
    paths: Vec<PathBuf>,
}

impl RawRecordStream {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Iterate every line of every file, in declared order
    pub fn iter(&self) -> RawRecordIter<'_> {
        RawRecordIter {
            paths: &self.paths,
            next_path: 0,
            reader: None,
            current: None,
            failed: false,
        }
    }

    /// Counting pass: number of lines across all files
    pub fn count(&self) -> Result<u64> {
        let mut rows = 0u64;
        for line in self.iter() {
            line?;
            rows += 1;
        }
        Ok(rows)
    }
}

impl<'a> IntoIterator for &'a RawRecordStream {
    type Item = Result<Vec<u8>>;
    type IntoIter = RawRecordIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`RawRecordStream::iter`]
///
/// Yields one item per physical line with the line terminator removed.
/// After an I/O error it yields that error once and then ends.
pub struct RawRecordIter<'a> {
    paths: &'a [PathBuf],
    next_path: usize,
    reader: Option<BufReader<File>>,
    current: Option<&'a Path>,
    failed: bool,
}

impl<'a> RawRecordIter<'a> {
    fn input_error(&mut self, path: &Path, source: std::io::Error) -> VectorizeError {
        self.failed = true;
        self.reader = None;
        VectorizeError::InputFile {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl<'a> Iterator for RawRecordIter<'a> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if let (Some(reader), Some(path)) = (self.reader.as_mut(), self.current) {
                let mut line = Vec::new();
                match reader.read_until(b'\n', &mut line) {
                    Ok(0) => {
                        self.reader = None;
                    }
                    Ok(_) => {
                        if line.last() == Some(&b'\n') {
                            line.pop();
                            if line.last() == Some(&b'\r') {
                                line.pop();
                            }
                        }
                        return Some(Ok(line));
                    }
                    Err(e) => return Some(Err(self.input_error(path, e))),
                }
            }

            let path = self.paths.get(self.next_path)?;
            self.next_path += 1;
            match File::open(path) {
                Ok(file) => {
                    self.reader = Some(BufReader::new(file));
                    self.current = Some(path.as_path());
                }
                Err(e) => return Some(Err(self.input_error(path, e))),
            }
        }
    }
}
