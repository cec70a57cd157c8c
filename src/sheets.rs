use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::auth::{fetch_access_token, ServiceAccountKey};
use crate::error::{Result, TranslatorError};
use crate::remap::MappingTable;
use crate::req::{Method, ReqClient};
use crate::secrets::SecretStore;
use crate::source::{records_to_table, Columns, MappingSource, Record};

pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Turn raw worksheet rows into records: the first row is the header, short
/// rows are padded with empty cells and cells past the header are dropped.
pub fn rows_to_records(rows: Vec<Vec<String>>) -> Vec<Record> {
    let mut rows = rows.into_iter();
    let header = match rows.next() {
        Some(header) => header,
        None => return Vec::new(),
    };
    rows.map(|row| {
        let mut record = Record::new();
        let mut cells = row.into_iter();
        for column in &header {
            let value = cells.next().unwrap_or_default();
            record.entry(column.clone()).or_insert(value);
        }
        record
    })
    .collect()
}

/// A1 range covering the whole of `worksheet`. The title is always quoted so
/// names like `Q1` or `A!B` are not read as cell references.
pub fn a1_sheet_range(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

/// Mapping tables stored as worksheets of one Google spreadsheet.
///
/// Credentials and rows are fetched fresh on every call; one
/// [`MappingSource::fetch_tables`] call shares a single access token.
#[derive(Debug)]
pub struct SheetsSource<S> {
    http: ReqClient,
    secrets: S,
    secret_name: String,
    spreadsheet_id: String,
    columns: Columns,
    api_base: String,
}

impl<S: SecretStore> SheetsSource<S> {
    pub fn new(
        http: ReqClient,
        secrets: S,
        secret_name: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        columns: Columns,
    ) -> Self {
        SheetsSource {
            http,
            secrets,
            secret_name: secret_name.into(),
            spreadsheet_id: spreadsheet_id.into(),
            columns,
            api_base: SHEETS_API.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn values_url(&self, worksheet: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base).map_err(|e| {
            TranslatorError::Configuration(format!("invalid sheets API base '{}': {}", self.api_base, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                TranslatorError::Configuration(format!("sheets API base '{}' cannot hold a path", self.api_base))
            })?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&a1_sheet_range(worksheet));
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        Ok(url)
    }

    /// Read the service-account key and trade it for a bearer token.
    pub async fn access_token(&self) -> Result<String> {
        let secret = self.secrets.get_secret(&self.secret_name).await?;
        let key = ServiceAccountKey::from_json(&secret)?;
        fetch_access_token(&self.http, &key).await
    }

    /// All data rows of `worksheet`, keyed by header.
    pub async fn get_all_records(&self, worksheet: &str) -> Result<Vec<Record>> {
        let token = self.access_token().await?;
        self.records_with_token(worksheet, &token).await
    }

    async fn records_with_token(&self, worksheet: &str, token: &str) -> Result<Vec<Record>> {
        let url = self.values_url(worksheet)?;
        debug!("fetching {}", url);
        let resp = self
            .http
            .prepare(Method::GET, url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| TranslatorError::Retrieval(format!("worksheet '{}': {}", worksheet, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TranslatorError::Authentication(
                    format!("access to spreadsheet {} denied ({}): {}", self.spreadsheet_id, status, detail),
                ),
                StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => TranslatorError::Retrieval(format!(
                    "worksheet '{}' of spreadsheet {} not found ({}): {}",
                    worksheet, self.spreadsheet_id, status, detail
                )),
                _ => TranslatorError::Retrieval(format!(
                    "worksheet '{}' unavailable ({}): {}",
                    worksheet, status, detail
                )),
            });
        }

        let range: ValueRange = resp.json().await.map_err(|e| {
            TranslatorError::Retrieval(format!("unexpected response for worksheet '{}': {}", worksheet, e))
        })?;
        Ok(rows_to_records(range.values))
    }
}

impl<S: SecretStore> SheetsSource<S> {
    async fn table_with_token(&self, table: &str, token: &str) -> Result<MappingTable> {
        let records = self.records_with_token(table, token).await?;
        debug!("{} records in {}: {:?}", records.len(), table, records);
        let table = records_to_table(table, &records, &self.columns)?;
        info!("loaded {} mappings from {}", table.len(), table.name());
        Ok(table)
    }
}

impl<S: SecretStore> MappingSource for SheetsSource<S> {
    async fn fetch_table(&self, table: &str) -> Result<MappingTable> {
        let token = self.access_token().await?;
        self.table_with_token(table, &token).await
    }

    async fn fetch_tables(&self, tables: &[&str]) -> Result<Vec<MappingTable>> {
        let token = self.access_token().await?;
        let mut fetched = Vec::with_capacity(tables.len());
        for table in tables {
            fetched.push(self.table_with_token(table, &token).await?);
        }
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::FileSecretStore;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn source() -> SheetsSource<FileSecretStore> {
        SheetsSource::new(
            ReqClient::new(None).unwrap(),
            FileSecretStore::new("secrets"),
            "dev/translator",
            "1CxDhoWYiTjSeOXMotycxmltDYxbafflghAEM6En0K9g",
            Columns {
                lookup: "Mandarin".into(),
                replacement: "Cantonese".into(),
            },
        )
    }

    #[test]
    fn header_row_keys_records() {
        let records = rows_to_records(rows(&[
            &["Mandarin", "Cantonese"],
            &["早上好", "早晨"],
            &["现在"],
        ]));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Cantonese"], "早晨");
        assert_eq!(records[1]["Mandarin"], "现在");
        assert_eq!(records[1]["Cantonese"], "");
    }

    #[test]
    fn cells_beyond_header_are_dropped() {
        let records = rows_to_records(rows(&[&["Mandarin"], &["现在", "stray"]]));
        assert_eq!(records[0].len(), 1);
    }

    #[test]
    fn empty_sheet_has_no_records() {
        assert!(rows_to_records(Vec::new()).is_empty());
        assert!(rows_to_records(rows(&[&["Mandarin", "Cantonese"]])).is_empty());
    }

    #[test]
    fn worksheet_title_is_escaped_in_url() {
        let url = source().values_url("First Pass").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/1CxDhoWYiTjSeOXMotycxmltDYxbafflghAEM6En0K9g/values/'First%20Pass'?majorDimension=ROWS"
        );
    }

    #[test]
    fn worksheet_title_is_quoted_as_a_range() {
        assert_eq!(a1_sheet_range("Q1"), "'Q1'");
        assert_eq!(a1_sheet_range("It's A!B"), "'It''s A!B'");
    }

    #[test]
    fn api_base_can_be_replaced() {
        let url = source()
            .with_api_base("http://127.0.0.1:9000/v4/spreadsheets/")
            .values_url("Mappings")
            .unwrap();
        assert!(url.as_str().starts_with("http://127.0.0.1:9000/v4/spreadsheets/1Cx"));
    }
}
