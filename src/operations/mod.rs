//! Shared operations used by both CLI and MCP server.
//!
//! Each operation takes an opened [`Tracker`](crate::tracker::Tracker) (or a
//! borrowed record set) and returns a serializable result, so `main.rs` and
//! `mcp/server.rs` print exactly the same fields.

pub mod list;
pub mod records;
pub mod scan;
pub mod stats;
pub mod transfer;

pub use list::{list_records, ListEntry, ListFilter, ListResult, ListSummary, SortKey};
pub use records::{show_record, update_record, Badge, BadgeOrigin, BadgeStatus, RecordDetail};
pub use scan::{run_scan, ScanOutput, ScanSource};
pub use stats::{get_stats, StatsResult};
pub use transfer::{
    clear_records, export_records, import_records, ClearOutput, ExportDocument, ImportOutput,
    EXPORT_FORMAT_VERSION,
};
