//! # Formats
//!
//! Table and report encodings. Pure transformations over readers and
//! writers; file handling lives in the app layer.
//!
//! - `table`: CSV in (raw records) and CSV out (annotated rows)
//! - `summary`: plain-text compliance summary

pub mod summary;
pub mod table;

pub use summary::render_summary;
pub use table::{ANNOTATED_COLUMNS, read_records, write_annotated};
