pub mod migrate;
pub mod record;
pub mod record_set;

pub use record::{FileRecord, RecordEdit};
pub use record_set::{RecordSet, SCHEMA_VERSION};
