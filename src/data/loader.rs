//! Dataset Loader Module
//! Fetches the country-day CSV from a URL or the local disk and parses it with Polars.

use polars::prelude::*;
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Default dataset published by Our World in Data.
pub const DEFAULT_SOURCE: &str = "https://covid.ourworldindata.org/data/owid-covid-data.csv";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to download dataset: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    /// `http://` and `https://` are downloaded, `file://` and bare paths are read from disk.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(LoadError::UnsupportedSource("empty source".to_string()));
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            Ok(Self::Url(source.to_string()))
        } else if let Some(path) = source.strip_prefix("file://") {
            Ok(Self::File(PathBuf::from(path)))
        } else if source.contains("://") {
            Err(LoadError::UnsupportedSource(source.to_string()))
        } else {
            Ok(Self::File(PathBuf::from(source)))
        }
    }

    /// Short name for the status line.
    pub fn display_name(&self) -> String {
        match self {
            Self::Url(url) => url.rsplit('/').next().unwrap_or(url).to_string(),
            Self::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.to_string_lossy().to_string()),
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{}", url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Reads the raw bytes of a dataset.
pub trait Fetch {
    fn fetch(&self) -> Result<Vec<u8>, LoadError>;
}

struct UrlFetcher<'a>(&'a str);

impl Fetch for UrlFetcher<'_> {
    fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        let response = reqwest::blocking::get(self.0)?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

struct FileFetcher<'a>(&'a std::path::Path);

impl Fetch for FileFetcher<'_> {
    fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        Ok(std::fs::read(self.0)?)
    }
}

impl Fetch for DataSource {
    fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        info!(source = %self, "fetching dataset");
        let bytes = match self {
            Self::Url(url) => UrlFetcher(url).fetch()?,
            Self::File(path) => FileFetcher(path).fetch()?,
        };
        debug!(bytes = bytes.len(), "dataset fetched");
        Ok(bytes)
    }
}

/// Column names from the header row.
fn header(bytes: &[u8]) -> Result<Vec<PlSmallStr>, LoadError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_n_rows(Some(0))
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df.get_column_names_owned())
}

/// Parse CSV bytes into a DataFrame.
///
/// Columns listed in `dtypes` that exist in the header are parsed with that dtype;
/// a value that does not parse fails the whole read. Absent columns are left for
/// the caller to report.
pub fn read_csv(bytes: Vec<u8>, dtypes: &[(&str, DataType)]) -> Result<DataFrame, LoadError> {
    let columns = header(&bytes)?;
    let overrides: Schema = dtypes
        .iter()
        .filter(|(name, _)| columns.iter().any(|c| c.as_str() == *name))
        .map(|(name, dtype)| Field::new((*name).into(), dtype.clone()))
        .collect();

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10000))
        .with_schema_overwrite(Some(Arc::new(overrides)))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}
