//! Tracking-table retrieval.
//!
//! Sources return raw rows (cells as JSON values, header included); typing
//! happens in [`crate::core::parse`].

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::error::DataSourceError;
use crate::io::config::SourceConfig;

const VALUE_RANGE_SCHEMA: &str = include_str!("../../schemas/value_range.schema.json");
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Raw rows of the tracking table, header row first.
pub type Rows = Vec<Vec<Value>>;

/// Abstraction over tracking data backends.
pub trait TrackingSource {
    fn fetch_rows(&self) -> Result<Rows, DataSourceError>;
}

/// `ValueRange` payload as returned by the Sheets values API.
#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Omitted by the API when the range is empty.
    #[serde(default)]
    values: Rows,
}

/// Reads an exported `ValueRange` JSON document from disk.
#[derive(Debug, Clone)]
pub struct ValuesFileSource {
    path: PathBuf,
}

impl ValuesFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TrackingSource for ValuesFileSource {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn fetch_rows(&self) -> Result<Rows, DataSourceError> {
        let contents = fs::read_to_string(&self.path).map_err(|err| {
            DataSourceError::Unavailable(format!("read {}: {err}", self.path.display()))
        })?;
        let value: Value = serde_json::from_str(&contents).map_err(|err| {
            DataSourceError::Malformed(format!("parse {}: {err}", self.path.display()))
        })?;
        validate_value_range(&value)
            .map_err(|err| DataSourceError::Malformed(format!("{}: {err:#}", self.path.display())))?;
        let range: ValueRange = serde_json::from_value(value)
            .map_err(|err| DataSourceError::Malformed(err.to_string()))?;
        debug!(rows = range.values.len(), "loaded tracking rows");
        Ok(range.values)
    }
}

fn validate_value_range(value: &Value) -> Result<()> {
    let schema: Value =
        serde_json::from_str(VALUE_RANGE_SCHEMA).context("parse value range schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    let messages: Vec<String> = compiled
        .iter_errors(value)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(anyhow!(
            "schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

/// Fetches rows from the Google Sheets values API with a bearer token.
#[derive(Debug, Clone)]
pub struct SheetsApiSource {
    spreadsheet_id: String,
    range: String,
    credentials_path: PathBuf,
}

impl SheetsApiSource {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        range: impl Into<String>,
        credentials_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
            credentials_path: credentials_path.into(),
        }
    }

    /// `{base}/{spreadsheet_id}/values/{range}` with path segments escaped.
    pub fn values_url(&self) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API_BASE).context("parse sheets api base url")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("sheets api base url cannot have path segments"))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&self.range);
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        Ok(url)
    }

    fn read_token(&self) -> Result<String> {
        let token = fs::read_to_string(&self.credentials_path)
            .with_context(|| format!("read credentials {}", self.credentials_path.display()))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(anyhow!(
                "credentials file {} is empty",
                self.credentials_path.display()
            ));
        }
        Ok(token.to_string())
    }

    fn fetch(&self) -> Result<Rows> {
        let token = self.read_token()?;
        let url = self.values_url()?;
        info!(spreadsheet_id = %self.spreadsheet_id, range = %self.range, "reading sheet");
        let response = reqwest::blocking::Client::new()
            .get(url)
            .bearer_auth(token)
            .send()
            .context("request sheet values")?
            .error_for_status()
            .context("sheets api returned an error status")?;
        let range: ValueRange = response.json().context("decode sheet values")?;
        debug!(rows = range.values.len(), "fetched tracking rows");
        Ok(range.values)
    }
}

impl TrackingSource for SheetsApiSource {
    fn fetch_rows(&self) -> Result<Rows, DataSourceError> {
        self.fetch()
            .map_err(|err| DataSourceError::Unavailable(format!("{err:#}")))
    }
}

/// Build the source described by configuration.
///
/// Paths are used as given; see [`PickerConfig::anchor_paths`](crate::io::config::PickerConfig::anchor_paths).
pub fn source_from_config(config: &SourceConfig) -> Box<dyn TrackingSource> {
    match config {
        SourceConfig::File { path } => Box::new(ValuesFileSource::new(path.clone())),
        SourceConfig::Sheets {
            spreadsheet_id,
            range,
            credentials_path,
        } => Box::new(SheetsApiSource::new(
            spreadsheet_id.clone(),
            range.clone(),
            credentials_path.clone().unwrap_or_default(),
        )),
    }
}
