//! Export of sync results for presentation and spreadsheet collaborators.

mod csv;
mod json;
mod rows;

pub use self::csv::{to_csv, write_csv};
pub use self::json::{to_json, JsonFormat};
pub use self::rows::{export_rows, ExportRow, SyncReport};
