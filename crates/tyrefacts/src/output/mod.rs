//! Exporting the final table and rendering text reports.

mod exporter;
pub mod report;

pub use exporter::{Artifact, ExportRecord, Exporter, TIMESTAMP_FORMAT};
