//! Persisted merged table and its manifest sidecar.
//!
//! Layout: `<merged>.csv` plus `<merged>.csv.manifest.json`.
//!
//! Both files are staged as `.tmp` siblings before either is renamed into
//! place. The manifest carries content hashes but no wall-clock time, so
//! identical inputs give identical bytes.

use super::error::{DataError, ValidationError};
use super::loader::{InputHashes, MergeReport};
use super::schema::{merged_contract, MERGED_COLUMNS};
use crate::domain::{MergedRecord, SentimentPhase};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Provenance of one merged table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeManifest {
    pub schema_version: u32,
    pub instrument: String,
    pub raw_trade_rows: usize,
    pub instrument_rows: usize,
    pub merged_rows: usize,
    pub excluded_rows: usize,
    pub superseded_sentiment_rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub trades_hash: String,
    pub sentiment_hash: String,
    pub merged_hash: String,
}

/// `<merged>.manifest.json` next to the merged table.
pub fn manifest_path(merged: &Path) -> PathBuf {
    let mut name = merged
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".manifest.json");
    merged.with_file_name(name)
}

/// Write `bytes` to `path` via a temp sibling and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DataError> {
    let staged = stage(path, bytes)?;
    commit(&staged, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    path.with_file_name(tmp_name)
}

/// Write and sync the `.tmp` sibling of `path`. Returns its path.
fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf, DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
    }

    let tmp = tmp_path(path);
    let written = fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(DataError::io(&tmp, e));
    }
    Ok(tmp)
}

fn commit(staged: &Path, path: &Path) -> Result<(), DataError> {
    fs::rename(staged, path).map_err(|e| {
        let _ = fs::remove_file(staged);
        DataError::io(path, e)
    })
}

/// Serialize merged rows as CSV with the fixed header.
pub fn encode_merged(records: &[MergedRecord]) -> Result<Vec<u8>, DataError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if records.is_empty() {
        // serde only emits the header alongside the first record
        writer
            .write_record(MERGED_COLUMNS.iter().map(|(name, _)| *name))
            .map_err(|e| encode_error(&e))?;
    }
    for record in records {
        writer.serialize(record).map_err(|e| encode_error(&e))?;
    }
    writer
        .into_inner()
        .map_err(|e| encode_error(&e.to_string()))
}

/// Persist the merged table and its manifest. Returns the manifest written.
///
/// Nothing at `path` or its manifest changes unless both files were staged.
pub fn write_merged(
    path: &Path,
    records: &[MergedRecord],
    report: &MergeReport,
    inputs: &InputHashes,
) -> Result<MergeManifest, DataError> {
    let bytes = encode_merged(records)?;
    let manifest = MergeManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        instrument: report.instrument.clone(),
        raw_trade_rows: report.raw_trade_rows,
        instrument_rows: report.instrument_rows,
        merged_rows: report.merged_rows,
        excluded_rows: report.excluded_rows,
        superseded_sentiment_rows: report.superseded_sentiment_rows,
        first_date: report.first_date,
        last_date: report.last_date,
        trades_hash: inputs.trades.clone(),
        sentiment_hash: inputs.sentiment.clone(),
        merged_hash: blake3::hash(&bytes).to_hex().to_string(),
    };
    let mut json = serde_json::to_vec_pretty(&manifest).map_err(|e| encode_error(&e))?;
    json.push(b'\n');

    let sidecar = manifest_path(path);
    let staged_table = stage(path, &bytes)?;
    let staged_manifest = match stage(&sidecar, &json) {
        Ok(staged) => staged,
        Err(e) => {
            let _ = fs::remove_file(&staged_table);
            return Err(e);
        }
    };
    if let Err(e) = commit(&staged_table, path) {
        let _ = fs::remove_file(&staged_manifest);
        return Err(e);
    }
    commit(&staged_manifest, &sidecar)?;

    debug!(path = %path.display(), rows = records.len(), hash = %manifest.merged_hash, "wrote merged table");
    Ok(manifest)
}

/// Load and validate a merged table written by `write_merged`.
pub fn read_merged(path: &Path) -> Result<Vec<MergedRecord>, DataError> {
    let bytes = fs::read(path).map_err(|e| DataError::io(path, e))?;
    let table = path.display().to_string();
    let malformed = |reason: String| -> DataError {
        ValidationError::Malformed {
            file: table.clone(),
            reason,
        }
        .into()
    };

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| malformed(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    merged_contract(&table).validate(&headers)?;

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<MergedRecord>().enumerate() {
        let record = result.map_err(|e| malformed(format!("row {row}: {e}")))?;
        if SentimentPhase::from_score(record.sentiment_score) != Some(record.sentiment_phase) {
            return Err(malformed(format!(
                "row {row}: phase {} inconsistent with score {}",
                record.sentiment_phase, record.sentiment_score
            )));
        }
        records.push(record);
    }
    debug!(path = %path.display(), rows = records.len(), "read merged table");
    Ok(records)
}

fn encode_error(err: &dyn std::fmt::Display) -> DataError {
    ValidationError::Malformed {
        file: "merged table".into(),
        reason: err.to_string(),
    }
    .into()
}
