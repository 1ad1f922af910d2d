// ============================================================================
// Bulk Importer
// ============================================================================
//
// Spreadsheet upload → CreateGuest inputs → one GuestDirectory::create per
// row. Parsing is all-or-nothing; submission is per row with no rollback.
//
// ============================================================================

pub mod errors;
pub mod parse;
pub mod report;

pub use errors::ImportError;
pub use parse::{parse, parse_csv, parse_xlsx, ImportFormat, ImportRow};
pub use report::{run_import, ImportReport, RowFailure};
