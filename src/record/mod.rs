//! Raw feature records and the input line stream

pub mod raw_record;
pub mod stream;

pub use raw_record::{Label, RawRecord};
pub use stream::{RawRecordIter, RawRecordStream};
