//! Mapping tables kept as CSV files, for running without Google credentials.
//!
//! Table `Mappings` is read from `<dir>/Mappings.csv`. The first row is the
//! header row, exactly like a worksheet exported from the spreadsheet.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TranslatorError};
use crate::remap::MappingTable;
use crate::source::{records_to_table, Columns, MappingSource, Record};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse CSV bytes into records keyed by header. A leading BOM is ignored,
/// short rows are padded with empty cells and cells past the header dropped.
pub fn parse_records(data: &[u8]) -> std::result::Result<Vec<Record>, csv::Error> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (idx, column) in headers.iter().enumerate() {
            let value = row.get(idx).unwrap_or_default();
            record
                .entry(column.to_string())
                .or_insert_with(|| value.to_string());
        }
        records.push(record);
    }
    Ok(records)
}

#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
    columns: Columns,
}

impl CsvSource {
    pub fn new(dir: impl AsRef<Path>, columns: Columns) -> Self {
        CsvSource {
            dir: dir.as_ref().to_path_buf(),
            columns,
        }
    }

    /// File holding `table`; names that would leave the directory are refused.
    pub fn path_for(&self, table: &str) -> Result<PathBuf> {
        let mut components = Path::new(table).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.dir.join(format!("{}.csv", table))),
            _ => Err(TranslatorError::Configuration(format!(
                "invalid table name '{}'",
                table
            ))),
        }
    }
}

impl MappingSource for CsvSource {
    async fn fetch_table(&self, table: &str) -> Result<MappingTable> {
        let path = self.path_for(table)?;
        debug!("reading {}", path.display());
        let data = tokio::fs::read(&path).await.map_err(|e| {
            TranslatorError::Retrieval(format!("table '{}' ({}): {}", table, path.display(), e))
        })?;
        let records = parse_records(&data).map_err(|e| {
            TranslatorError::Configuration(format!("table '{}' ({}): {}", table, path.display(), e))
        })?;
        let table = records_to_table(table, &records, &self.columns)?;
        info!("loaded {} mappings from {}", table.len(), path.display());
        Ok(table)
    }
}
