pub mod coerce;
pub mod index;
pub mod records;
pub mod source;

pub use coerce::RawRow;
pub use index::{parse_source_index, parse_target_overrides, sheet_id, SourceEntry};
pub use records::{normalize_source_rows, SourceBatch, UnitAliases};
pub use source::{load_snapshot, LoadedSource, RowSource, SheetRef, Snapshot, SourceFailure};
