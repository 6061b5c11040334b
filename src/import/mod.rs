//! Batch input import

pub mod csv;

pub use self::csv::{CsvInputImporter, ImportedRow, REQUIRED_COLUMNS};
