//! Read an archive back and summarize what it holds.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use flate2::read::GzDecoder;
use orion_error::StructError;
use serde::{Deserialize, Serialize};

use crate::error::{GenReason, GenResult};
use crate::synth::TIMESTAMP_FORMAT;

/// Owned form of one decoded record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveRecord {
    pub app: String,
    pub context: RecordContext,
    pub latency: f64,
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordContext {
    pub os: String,
    pub version: String,
}

impl ArchiveRecord {
    /// Parsed `timestamp`, `None` if it does not match [`TIMESTAMP_FORMAT`].
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .ok()
            .map(|t| t.and_utc())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ArchiveSummary {
    pub records: usize,
    pub apps: BTreeMap<String, usize>,
    pub event_types: BTreeMap<String, usize>,
    pub oses: BTreeMap<String, usize>,
    pub latency: Option<LatencyStats>,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
}

/// Whole decompressed contents of the archive at `path`.
pub fn decompress(path: &Path) -> GenResult<String> {
    let file = File::open(path).map_err(|e| {
        StructError::from(GenReason::Io).with_detail(format!("open {}: {e}", path.display()))
    })?;
    let mut text = String::new();
    GzDecoder::new(BufReader::new(file))
        .read_to_string(&mut text)
        .map_err(|e| {
            StructError::from(GenReason::Io)
                .with_detail(format!("decompress {}: {e}", path.display()))
        })?;
    Ok(text)
}

/// Split decompressed text on the record separator. An empty stream has
/// no records.
pub fn parse_records(text: &str) -> GenResult<Vec<ArchiveRecord>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split('\n')
        .enumerate()
        .map(|(line, raw)| {
            serde_json::from_str(raw).map_err(|e| {
                StructError::from(GenReason::Encode).with_detail(format!("line {}: {e}", line + 1))
            })
        })
        .collect()
}

pub fn read_records(path: &Path) -> GenResult<Vec<ArchiveRecord>> {
    let records = parse_records(&decompress(path)?)?;
    dd_debug!(io, path = %path.display(), records = records.len(), "archive read");
    Ok(records)
}

pub fn summarize(records: &[ArchiveRecord]) -> ArchiveSummary {
    let mut summary = ArchiveSummary {
        records: records.len(),
        ..ArchiveSummary::default()
    };

    let mut latency_sum = 0.0;
    let mut stats: Option<LatencyStats> = None;
    for r in records {
        *summary.apps.entry(r.app.clone()).or_default() += 1;
        *summary.event_types.entry(r.event_type.clone()).or_default() += 1;
        *summary.oses.entry(r.context.os.clone()).or_default() += 1;

        latency_sum += r.latency;
        let s = stats.get_or_insert(LatencyStats {
            min: r.latency,
            mean: 0.0,
            max: r.latency,
        });
        s.min = s.min.min(r.latency);
        s.max = s.max.max(r.latency);
    }
    if let Some(s) = stats.as_mut() {
        s.mean = latency_sum / records.len() as f64;
    }
    summary.latency = stats;

    // Fixed-width format, so lexical order is chronological order.
    summary.first_timestamp = records.iter().map(|r| &r.timestamp).min().cloned();
    summary.last_timestamp = records.iter().map(|r| &r.timestamp).max().cloned();
    summary
}

pub fn inspect_archive(path: &Path) -> GenResult<ArchiveSummary> {
    Ok(summarize(&read_records(path)?))
}
