//! Interaction records: the normalized rows of an assistant history export.
//!
//! Records are loaded from CSV, a JSON array, or JSON Lines. Column names are
//! matched through serde aliases, so both the normalized schema
//! (`topic_label`, `body_text`, ...) and the raw export headers
//! (`Conversation`, `Message`, `Time`, `Author`) are accepted. Unknown fields
//! are ignored. A row that cannot be read is skipped with a warning; only a
//! broken container (unreadable file, missing CSV header, invalid JSON array)
//! fails the load.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{RecordError, RecordResult};
use crate::text;

/// One historical exchange. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    #[serde(default, alias = "Time", alias = "time")]
    pub timestamp: Option<String>,
    #[serde(
        default,
        alias = "primary_topic",
        alias = "topic",
        alias = "Conversation",
        alias = "conversation"
    )]
    pub topic_label: String,
    #[serde(
        default,
        alias = "excerpt",
        alias = "text",
        alias = "body",
        alias = "Message",
        alias = "message"
    )]
    pub body_text: String,
    #[serde(default, alias = "source", alias = "Source")]
    pub source_hint: Option<String>,
    #[serde(default, alias = "Author", alias = "author")]
    pub role: Option<String>,
}

impl InteractionRecord {
    /// Convenience constructor used by tests and library callers.
    pub fn new(topic_label: impl Into<String>, body_text: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            topic_label: topic_label.into(),
            body_text: body_text.into(),
            source_hint: None,
            role: None,
        }
    }

    pub fn with_timestamp(mut self, ts: impl Into<String>) -> Self {
        self.timestamp = Some(ts.into());
        self
    }

    pub fn with_source_hint(mut self, hint: impl Into<String>) -> Self {
        self.source_hint = Some(hint.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Best-effort timestamp parse.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }

    /// Normalized, length-bounded excerpt of the body.
    pub fn excerpt(&self) -> String {
        text::excerpt(&self.body_text)
    }

    fn normalized(self) -> Self {
        let role = self.role.map(|r| match r.trim() {
            "AI" | "ai" | "Assistant" | "assistant" | "Copilot" => "assistant".to_string(),
            "Human" | "human" | "User" | "user" | "" => "user".to_string(),
            other => other.to_lowercase(),
        });
        Self {
            timestamp: self
                .timestamp
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            topic_label: self.topic_label.trim().to_string(),
            body_text: text::normalize_whitespace(&self.body_text),
            source_hint: self
                .source_hint
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            role,
        }
    }
}

/// Parse the timestamp shapes seen in assistant exports.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    let trimmed = raw.trim_end_matches('Z');
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%m/%d/%Y %I:%M %p",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Csv,
    Json,
    JsonLines,
}

impl RecordFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> RecordResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::parse(&ext)
    }

    pub fn parse(name: &str) -> RecordResult<Self> {
        match name {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "jsonl" | "ndjson" => Ok(Self::JsonLines),
            other => Err(RecordError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// A row that was skipped while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordWarning {
    /// 1-based row (CSV data row, JSON array index + 1, or JSONL line).
    pub row: usize,
    pub message: String,
}

/// Records that survived loading plus the rows that were skipped.
#[derive(Debug, Clone, Default)]
pub struct RecordBatch {
    pub records: Vec<InteractionRecord>,
    pub warnings: Vec<RecordWarning>,
}

impl RecordBatch {
    /// Load a record file, detecting the format from its extension.
    pub fn load(path: &Path) -> RecordResult<Self> {
        let format = RecordFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| RecordError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let batch = Self::parse(&content, format).map_err(|message| RecordError::Malformed {
            path: path.display().to_string(),
            message,
        })?;
        for w in &batch.warnings {
            tracing::warn!(path = %path.display(), row = w.row, "skipped record: {}", w.message);
        }
        tracing::info!(
            path = %path.display(),
            records = batch.records.len(),
            skipped = batch.warnings.len(),
            "loaded interaction records"
        );
        Ok(batch)
    }

    /// Parse records from in-memory content. The error string describes a
    /// container-level failure.
    pub fn parse(content: &str, format: RecordFormat) -> Result<Self, String> {
        let rows: Vec<(usize, Result<serde_json::Value, String>)> = match format {
            RecordFormat::Json => {
                let values: Vec<serde_json::Value> =
                    serde_json::from_str(content).map_err(|e| e.to_string())?;
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i + 1, Ok(v)))
                    .collect()
            }
            RecordFormat::JsonLines => content
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, line)| (i + 1, serde_json::from_str(line).map_err(|e| e.to_string())))
                .collect(),
            RecordFormat::Csv => csv_rows(content)?,
        };

        let mut batch = Self::default();
        for (row, value) in rows {
            let parsed = value.and_then(|v| {
                serde_json::from_value::<InteractionRecord>(v).map_err(|e| e.to_string())
            });
            match parsed {
                Ok(record) => {
                    let record = record.normalized();
                    if record.topic_label.is_empty() && record.body_text.is_empty() {
                        batch.warnings.push(RecordWarning {
                            row,
                            message: "record has neither topic label nor body text".into(),
                        });
                    } else {
                        batch.records.push(record);
                    }
                }
                Err(message) => batch.warnings.push(RecordWarning { row, message }),
            }
        }
        Ok(batch)
    }

    /// Keep records whose timestamp falls in the inclusive date range.
    /// Records without a parseable timestamp are kept. Returns the number dropped.
    pub fn retain_date_range(&mut self, since: Option<NaiveDate>, until: Option<NaiveDate>) -> usize {
        if since.is_none() && until.is_none() {
            return 0;
        }
        let before = self.records.len();
        self.records.retain(|r| match r.parsed_timestamp() {
            None => true,
            Some(ts) => {
                let day = ts.date();
                since.is_none_or(|s| day >= s) && until.is_none_or(|u| day <= u)
            }
        });
        before - self.records.len()
    }

    /// Drop repeated records with the same excerpt, role and topic label,
    /// keeping the first occurrence. Returns the number dropped.
    pub fn dedupe(&mut self) -> usize {
        let before = self.records.len();
        let mut seen: HashSet<(String, Option<String>, String)> = HashSet::new();
        self.records
            .retain(|r| seen.insert((r.excerpt(), r.role.clone(), r.topic_label.clone())));
        before - self.records.len()
    }
}

/// Split CSV content into header-keyed JSON objects.
fn csv_rows(content: &str) -> Result<Vec<(usize, Result<serde_json::Value, String>)>, String> {
    let mut rows = split_csv(content)?.into_iter();
    let header = loop {
        match rows.next() {
            Some(r) if r.iter().all(|f| f.trim().is_empty()) => continue,
            Some(r) => break r,
            None => return Err("no header row found".into()),
        }
    };
    let header: Vec<String> = header
        .into_iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    Ok(rows
        .filter(|r| !r.iter().all(|f| f.trim().is_empty()))
        .enumerate()
        .map(|(i, fields)| {
            let row = i + 1;
            if fields.len() != header.len() {
                return (
                    row,
                    Err(format!(
                        "expected {} fields, found {}",
                        header.len(),
                        fields.len()
                    )),
                );
            }
            let obj: serde_json::Map<String, serde_json::Value> = header
                .iter()
                .cloned()
                .zip(fields.into_iter().map(serde_json::Value::String))
                .collect();
            (row, Ok(serde_json::Value::Object(obj)))
        })
        .collect())
}

/// Minimal RFC 4180 splitter: quoted fields, doubled quotes, embedded newlines.
fn split_csv(content: &str) -> Result<Vec<Vec<String>>, String> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".into());
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    Ok(rows)
}
