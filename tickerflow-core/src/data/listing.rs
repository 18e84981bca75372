//! Symbol lists: exchange directories and curated ticker CSVs.
//!
//! Exchange directories (NASDAQ `nasdaqlisted.txt`, NasdaqTrader
//! `otherlisted.txt`) are pipe-delimited with a header row and a trailer row
//! starting with `File Creation Time`. Only the ETF directory readers drop
//! that trailer; on the NASDAQ path it reaches the broker like any other
//! symbol and fails there. Curated ticker lists are plain comma-separated
//! files with a `symbol` column.

use crate::domain::ListedSecurity;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// NasdaqTrader directory of non-NASDAQ listings (ETFs included).
pub const NASDAQ_OTHER_LISTED_URL: &str =
    "https://www.nasdaqtrader.com/dynamic/SymDir/otherlisted.txt";

/// Trailer row marker in NasdaqTrader directory files.
const TRAILER_PREFIX: &str = "File Creation Time";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("read listing {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("parse listing: {0}")]
    Csv(#[from] csv::Error),

    #[error("listing has no '{column}' column")]
    MissingColumn { column: String },

    #[error("download listing: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download listing {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },
}

/// Column names of a pipe-delimited exchange directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingFormat {
    pub symbol_column: &'static str,
    pub name_column: &'static str,
}

impl ListingFormat {
    /// `nasdaqlisted.txt` layout.
    pub const NASDAQ: ListingFormat = ListingFormat {
        symbol_column: "Symbol",
        name_column: "Security Name",
    };

    /// `otherlisted.txt` layout (NYSE, Arca, BATS; most ETFs).
    pub const OTHER_LISTED: ListingFormat = ListingFormat {
        symbol_column: "ACT Symbol",
        name_column: "Security Name",
    };
}

/// Parse a pipe-delimited exchange directory.
///
/// Rows with an empty symbol are dropped; the trailer row is kept. A missing
/// name column yields `name: None` on every row; a
/// missing symbol column is an error.
pub fn parse_listing<R: Read>(
    reader: R,
    format: ListingFormat,
) -> Result<Vec<ListedSecurity>, ListingError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let symbol_idx = column_index(&headers, format.symbol_column).ok_or_else(|| {
        ListingError::MissingColumn {
            column: format.symbol_column.to_string(),
        }
    })?;
    let name_idx = column_index(&headers, format.name_column);

    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let symbol = record.get(symbol_idx).unwrap_or("").trim();
        if symbol.is_empty() {
            continue;
        }
        let name = name_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from);
        out.push(ListedSecurity::new(symbol, name));
    }
    Ok(out)
}

/// Parse a local directory file.
pub fn read_listing_file(
    path: &Path,
    format: ListingFormat,
) -> Result<Vec<ListedSecurity>, ListingError> {
    let file = std::fs::File::open(path).map_err(|source| ListingError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let listing = parse_listing(file, format)?;
    info!(path = %path.display(), count = listing.len(), "loaded listing");
    Ok(listing)
}

/// Blocking HTTP client for directory downloads. No retry, no caching.
pub struct ListingDownloader {
    client: reqwest::blocking::Client,
}

impl ListingDownloader {
    pub fn new() -> Result<Self, ListingError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and return the body. A non-success status is an error.
    pub fn fetch_text(&self, url: &str) -> Result<String, ListingError> {
        info!(url, "downloading listing");
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ListingError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.text()?)
    }
}

/// Parse the non-NASDAQ directory (`otherlisted.txt`) from its raw text,
/// dropping the `File Creation Time` trailer.
pub fn parse_etf_listing(text: &str) -> Result<Vec<ListedSecurity>, ListingError> {
    Ok(drop_trailer(parse_listing(
        text.as_bytes(),
        ListingFormat::OTHER_LISTED,
    )?))
}

/// Read a local copy of the non-NASDAQ directory, dropping the trailer.
pub fn read_etf_listing_file(path: &Path) -> Result<Vec<ListedSecurity>, ListingError> {
    Ok(drop_trailer(read_listing_file(
        path,
        ListingFormat::OTHER_LISTED,
    )?))
}

/// One-shot download of the non-NASDAQ directory at `url`.
pub fn download_listing(url: &str) -> Result<Vec<ListedSecurity>, ListingError> {
    let text = ListingDownloader::new()?.fetch_text(url)?;
    let listing = parse_etf_listing(&text)?;
    info!(url, count = listing.len(), "loaded listing");
    Ok(listing)
}

fn drop_trailer(listing: Vec<ListedSecurity>) -> Vec<ListedSecurity> {
    listing
        .into_iter()
        .filter(|s| !s.symbol.starts_with(TRAILER_PREFIX))
        .collect()
}

/// Read a curated ticker CSV with a `symbol` column.
///
/// Blank cells are dropped and duplicates collapse to their first
/// occurrence.
pub fn read_symbol_csv(path: &Path) -> Result<Vec<String>, ListingError> {
    let file = std::fs::File::open(path).map_err(|source| ListingError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_symbol_csv(file)
}

/// Parse a curated ticker CSV from any reader.
pub fn parse_symbol_csv<R: Read>(reader: R) -> Result<Vec<String>, ListingError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let idx = column_index(&headers, "symbol").ok_or_else(|| ListingError::MissingColumn {
        column: "symbol".to_string(),
    })?;

    let mut symbols = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let symbol = record.get(idx).unwrap_or("").trim();
        if !symbol.is_empty() {
            symbols.push(symbol.to_string());
        }
    }
    Ok(dedup_symbols(symbols))
}

/// Order-preserving de-duplication; the first occurrence wins.
pub fn dedup_symbols<I, S>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .map(Into::into)
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}
