// src/pipeline/export.rs

//! Record export.
//!
//! Writes the final store either as a spreadsheet (sheet `reg_book`, one header
//! row followed by one row per record) or as a JSON array. Files are written to
//! a temporary sibling first and renamed into place.

use std::path::Path;

use async_trait::async_trait;
use rust_xlsxwriter::Workbook;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::Record;
use crate::store::RecordStore;

/// Sheet name used by spreadsheet exports.
pub const SHEET_NAME: &str = "reg_book";

/// Destination format for the final record store.
#[async_trait]
pub trait RecordExport: Send + Sync {
    /// Write all records of `store` to `path`.
    async fn export(&self, store: &RecordStore, path: &Path) -> Result<()>;
}

/// Spreadsheet (`.xlsx`) export.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxExport;

impl XlsxExport {
    fn render(store: &RecordStore) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, name) in Record::COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *name)?;
        }

        for (index, record) in store.records().enumerate() {
            let row = (index + 1) as u32;
            for (col, value) in record.values().iter().enumerate() {
                sheet.write_string(row, col as u16, *value)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

#[async_trait]
impl RecordExport for XlsxExport {
    async fn export(&self, store: &RecordStore, path: &Path) -> Result<()> {
        let bytes = Self::render(store)?;
        write_atomic(path, &bytes).await
    }
}

/// Pretty-printed JSON array export.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExport;

#[async_trait]
impl RecordExport for JsonExport {
    async fn export(&self, store: &RecordStore, path: &Path) -> Result<()> {
        let records: Vec<&Record> = store.records().collect();
        let bytes = serde_json::to_vec_pretty(&records)?;
        write_atomic(path, &bytes).await
    }
}

/// Pick the exporter for `path`: `.json` writes JSON, anything else a spreadsheet.
pub fn exporter_for(path: &Path) -> Box<dyn RecordExport> {
    if is_json_path(path) {
        Box::new(JsonExport)
    } else {
        Box::new(XlsxExport)
    }
}

fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Export `store` to `path` in the format its extension selects.
pub async fn export_records(store: &RecordStore, path: &Path) -> Result<()> {
    if store.is_empty() {
        log::warn!("No records found, writing an empty export");
    }

    exporter_for(path).export(store, path).await?;
    log::info!("Saved {} record(s) to {}", store.len(), path.display());
    Ok(())
}

/// Write bytes atomically (write to temp, then rename).
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> Record {
        Record {
            flag: "Панама".to_string(),
            primary_name: format!("СУДНО {id}"),
            secondary_name: format!("SHIP {id}"),
            home_port: "Panama".to_string(),
            call_sign: "3EAB".to_string(),
            registry_number: format!("R{id}"),
            identifier: id.to_string(),
        }
    }

    fn store() -> RecordStore {
        let mut store = RecordStore::new();
        store.insert(record("9100002"));
        store.insert(record("9100001"));
        store
    }

    #[test]
    fn test_format_follows_extension() {
        assert!(is_json_path(Path::new("out.json")));
        assert!(is_json_path(Path::new("out.JSON")));
        assert!(!is_json_path(Path::new("out.xlsx")));
        assert!(!is_json_path(Path::new("out")));
        assert!(!is_json_path(Path::new("dir.json/out.xls")));
    }

    #[tokio::test]
    async fn test_json_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ships.json");

        export_records(&store(), &path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Record> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].identifier, "9100001");
        assert_eq!(parsed[1].identifier, "9100002");
        assert!(content.contains("\"imo_number\""));
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_xlsx_export_writes_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regbook.xlsx");

        export_records(&store(), &path).await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx files are zip archives
        assert!(bytes.starts_with(b"PK"));
        let has_entry = |name: &[u8]| bytes.windows(name.len()).any(|w| w == name);
        assert!(has_entry(b"xl/worksheets/sheet1.xml"));
        assert!(has_entry(b"xl/sharedStrings.xml"));
    }

    #[tokio::test]
    async fn test_empty_store_still_exported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        export_records(&RecordStore::new(), &path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim(), "[]");
    }
}
