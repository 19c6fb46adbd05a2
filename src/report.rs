//! Persisting run results: the verified-address JSON array and the optional
//! per-address report.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::types::{ProbeOutcome, VerifiedSet};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "with-csv")]
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("report format '{0}' requires the 'with-csv' feature")]
    FormatUnavailable(&'static str),
    #[error("unknown report format '{0}', use: ndjson|csv")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Ndjson,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            "csv" => Ok(Self::Csv),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Write `bytes` to `path` through a sibling `.tmp` file and a rename, so a
/// crash never leaves a half-written output.
pub fn write_all_atomically(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    {
        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(bytes).map_err(io_err)?;
        f.sync_all().map_err(io_err)?;
    }
    std::fs::rename(&tmp, path).map_err(io_err)
}

/// The sole durable output of a run: a JSON array of valid addresses.
pub fn write_verified(path: &Path, verified: &VerifiedSet) -> Result<(), ReportError> {
    let mut json = verified.to_json()?;
    json.push('\n');
    write_all_atomically(path, json.as_bytes())
}

pub fn render_ndjson(outcomes: &[ProbeOutcome]) -> Result<Vec<u8>, ReportError> {
    let mut buf = Vec::new();
    for outcome in outcomes {
        let line = serde_json::to_string(outcome)?;
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }
    Ok(buf)
}

#[cfg(feature = "with-csv")]
pub fn render_csv(outcomes: &[ProbeOutcome]) -> Result<Vec<u8>, ReportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["address", "result", "detail", "host", "code", "attempts"])?;
    for o in outcomes {
        let code = o.code.map(|c| c.to_string()).unwrap_or_default();
        let attempts = o.attempts.to_string();
        wtr.write_record([
            o.address.as_str(),
            o.result.label(),
            o.detail.as_str(),
            o.host.as_deref().unwrap_or(""),
            code.as_str(),
            attempts.as_str(),
        ])?;
    }
    wtr.into_inner()
        .map_err(|err| ReportError::Csv(csv::Error::from(err.into_error())))
}

pub fn render_report(
    outcomes: &[ProbeOutcome],
    format: ReportFormat,
) -> Result<Vec<u8>, ReportError> {
    match format {
        ReportFormat::Ndjson => render_ndjson(outcomes),
        #[cfg(feature = "with-csv")]
        ReportFormat::Csv => render_csv(outcomes),
        #[cfg(not(feature = "with-csv"))]
        ReportFormat::Csv => Err(ReportError::FormatUnavailable("csv")),
    }
}

pub fn write_report(
    path: &Path,
    outcomes: &[ProbeOutcome],
    format: ReportFormat,
) -> Result<(), ReportError> {
    let bytes = render_report(outcomes, format)?;
    write_all_atomically(path, &bytes)
}

/// One console line per outcome, e.g. `[valid] a@example.com :: 250 Ok (mx.example.com)`.
pub fn human_line(outcome: &ProbeOutcome) -> String {
    let mut line = format!(
        "[{}] {} :: {}",
        outcome.result.label(),
        outcome.address,
        outcome.detail
    );
    if let Some(host) = &outcome.host {
        line.push_str(&format!(" ({host})"));
    }
    line
}
