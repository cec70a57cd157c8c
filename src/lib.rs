//! Rewrites Mandarin text into Cantonese with user-editable mapping tables
//! and serves the result as a two-column web page.

pub mod auth;
pub mod config;
pub mod csv_source;
pub mod error;
pub mod form;
pub mod handler;
pub mod normalize;
pub mod pipeline;
pub mod remap;
pub mod render;
pub mod req;
pub mod secrets;
pub mod server;
pub mod sheets;
pub mod source;

pub use crate::config::{Loader, TranslatorConfig};
pub use crate::error::{Result, TranslatorError};
pub use crate::handler::{Event, Handler, Response};

use csv_source::CsvSource;
use normalize::ZhconvNormalizer;
use req::ReqClient;
use secrets::FileSecretStore;
use sheets::SheetsSource;
use source::Columns;

fn columns(config: &TranslatorConfig) -> Columns {
    Columns {
        lookup: config.lookup_column.clone(),
        replacement: config.replacement_column.clone(),
    }
}

/// Handler backed by the configured spreadsheet and file secret store.
pub fn sheets_handler(config: TranslatorConfig) -> Result<Handler<SheetsSource<FileSecretStore>>> {
    config.validate()?;
    let source = SheetsSource::new(
        ReqClient::new(None)?,
        FileSecretStore::new(&config.secrets_dir),
        &config.secret_name,
        config.spreadsheet_id()?,
        columns(&config),
    );
    let normalizer = ZhconvNormalizer::new(config.script_variant);
    Ok(Handler::new(config, source, normalizer))
}

/// Handler reading its tables from the CSV files in `mapping_dir`.
pub fn csv_handler(config: TranslatorConfig) -> Result<Handler<CsvSource>> {
    config.validate()?;
    if !config.uses_local_tables() {
        return Err(TranslatorError::Configuration("'mapping_dir' must be set".into()));
    }
    let source = CsvSource::new(&config.mapping_dir, columns(&config));
    let normalizer = ZhconvNormalizer::new(config.script_variant);
    Ok(Handler::new(config, source, normalizer))
}
