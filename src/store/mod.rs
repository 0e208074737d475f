//! Scoped document persistence.
//!
//! Every document is read fully into memory and written with a
//! write-to-temp-then-rename discipline: the bytes land in a hidden sibling
//! file, are synced, and only then replace the destination. A failed write
//! leaves the previous version untouched.

use std::io::Write as _;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StoreError, StoreResult};

/// Read and parse a JSON document. Returns `Ok(None)` when the file is absent.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path).map_err(|e| StoreError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|e| StoreError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}

/// Serialize a document as pretty JSON and write it atomically.
pub fn write_json<T: Serialize>(path: &Path, doc: &T) -> StoreResult<()> {
    let mut json = serde_json::to_string_pretty(doc).map_err(|e| StoreError::Serialize {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

/// Write `bytes` to `path` through a synced temp file and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.display().to_string(),
        source,
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let tmp = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document"),
        std::process::id()
    ));
    let result = (|| {
        let mut f = std::fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
        std::fs::rename(&tmp, path)
    })();
    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    if let Ok(dir) = std::fs::File::open(&parent) {
        let _ = dir.sync_all();
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_document_reads_as_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc: Option<Vec<String>> = read_json(&dir.path().join("absent.json")).unwrap();
        assert!(doc.is_none());
    }

    #[test]
    fn write_then_read_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        write_json(&path, &vec!["a".to_string(), "b".to_string()]).unwrap();

        let back: Vec<String> = read_json(&path).unwrap().unwrap();
        assert_eq!(back, vec!["a", "b"]);

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn parse_error_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_json::<Vec<String>>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn failed_write_keeps_previous_version() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &vec!["v1".to_string()]).unwrap();

        // A directory cannot be the rename target of a file.
        let blocked = dir.path().join("blocked");
        std::fs::create_dir_all(blocked.join("child")).unwrap();
        assert!(write_atomic(&blocked, b"x").is_err());

        let back: Vec<String> = read_json(&path).unwrap().unwrap();
        assert_eq!(back, vec!["v1"]);
    }
}
