use serde::Serialize;

use crate::domain::errors::ErrorKind;
use crate::domain::guest::GuestDirectory;
use super::parse::ImportRow;

#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    pub row: usize,
    pub message: String,
    #[serde(skip)]
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub total: usize,
    pub imported: usize,
    pub errors: Vec<RowFailure>,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Submit every row through the directory in order. A failing row never
/// stops the rest, and rows already created stay created.
pub async fn run_import(directory: &GuestDirectory, rows: Vec<ImportRow>, caller: &str) -> ImportReport {
    let mut report = ImportReport {
        total: rows.len(),
        ..Default::default()
    };

    for ImportRow { row, input } in rows {
        match directory.create(input, caller).await {
            Ok(_) => report.imported += 1,
            Err(e) => {
                tracing::warn!(row = row, error = %e, "Import: row rejected");
                report.errors.push(RowFailure {
                    row,
                    message: e.to_string(),
                    kind: e.kind(),
                });
            }
        }
    }

    tracing::info!(
        total = report.total,
        imported = report.imported,
        failed = report.errors.len(),
        caller = %caller,
        "📥 Import finished"
    );
    report
}
