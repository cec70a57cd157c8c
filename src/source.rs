use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use crate::error::{Result, TranslatorError};
use crate::remap::{MappingRule, MappingTable};

/// One data row keyed by column header.
pub type Record = BTreeMap<String, String>;

/// Supplies mapping tables by name, preserving source row order.
pub trait MappingSource: Send + Sync {
    fn fetch_table(&self, table: &str) -> impl Future<Output = Result<MappingTable>> + Send;

    /// Fetch several tables for one request, in the order given.
    fn fetch_tables(&self, tables: &[&str]) -> impl Future<Output = Result<Vec<MappingTable>>> + Send {
        async move {
            let mut fetched = Vec::with_capacity(tables.len());
            for table in tables {
                fetched.push(self.fetch_table(table).await?);
            }
            Ok(fetched)
        }
    }
}

/// Headers of the lookup and replacement columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub lookup: String,
    pub replacement: String,
}

/// Convert records into rules, in order.
///
/// Extra columns are ignored and rows whose lookup and replacement cells are
/// both empty are skipped. A record without one of the configured columns, or
/// with an empty lookup next to a replacement, is a configuration error.
pub fn records_to_table(name: &str, records: &[Record], columns: &Columns) -> Result<MappingTable> {
    let mut rules = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        // header is row 1
        let row = idx + 2;
        let cell = |column: &str| {
            record.get(column).ok_or_else(|| {
                TranslatorError::Configuration(format!(
                    "table '{}' row {} has no '{}' column",
                    name, row, column
                ))
            })
        };
        let lookup = cell(&columns.lookup)?;
        let replacement = cell(&columns.replacement)?;
        if lookup.is_empty() && replacement.is_empty() {
            continue;
        }
        let rule = MappingRule::new(lookup.as_str(), replacement.as_str()).map_err(|e| {
            TranslatorError::Configuration(format!("table '{}' row {}: {}", name, row, e))
        })?;
        rules.push(rule);
    }
    Ok(MappingTable::new(name, rules))
}

/// Tables held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    tables: HashMap<String, MappingTable>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: MappingTable) -> Self {
        self.tables.insert(table.name().to_string(), table);
        self
    }
}

impl MappingSource for StaticSource {
    async fn fetch_table(&self, table: &str) -> Result<MappingTable> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| TranslatorError::Retrieval(format!("worksheet '{}' not found", table)))
    }
}
