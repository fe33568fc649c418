//! File-backed record source
//!
//! Reads a JSON array or a YAML sequence of records. The format is picked
//! from the file extension (`.json`, `.yaml`, `.yml`).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use super::CartSource;
use crate::error::SourceError;
use crate::models::InputRecord;

/// Supported record file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Yaml,
}

impl RecordFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(RecordFormat::Json),
            "yaml" | "yml" => Ok(RecordFormat::Yaml),
            _ => Err(SourceError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Parse records from file content
    pub fn parse(self, content: &str) -> Result<Vec<InputRecord>, SourceError> {
        match self {
            RecordFormat::Json => {
                serde_json::from_str(content).map_err(|e| SourceError::Parse(e.to_string()))
            }
            RecordFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| SourceError::Parse(e.to_string()))
            }
        }
    }
}

/// Source reading records from a local file
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CartSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self) -> Result<Vec<InputRecord>, SourceError> {
        let format = RecordFormat::from_path(&self.path)?;
        let content = tokio::fs::read_to_string(&self.path).await?;
        let records = format.parse(&content)?;

        info!(
            path = %self.path.display(),
            records = records.len(),
            "Loaded abandoned cart records"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // Test 1: JSON array of records
    #[tokio::test]
    async fn test_fetch_json() {
        let file = write_temp(
            ".json",
            r#"[
                {"identity_key": "A123", "cart_value": "49.99"},
                {"user_id": "B000", "product_quantity_price": 10}
            ]"#,
        );

        let records = FileSource::new(file.path()).fetch().await.unwrap();

        assert_eq!(
            records,
            vec![
                InputRecord::new("A123", "49.99"),
                InputRecord::new("B000", "10"),
            ]
        );
    }

    // Test 2: YAML sequence of records
    #[tokio::test]
    async fn test_fetch_yaml() {
        let file = write_temp(
            ".yaml",
            r#"
- identity_key: "A123"
  cart_value: "49.99"
- identity_key: "C777"
  cart_value: "1 x $5.00"
"#,
        );

        let records = FileSource::new(file.path()).fetch().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1], InputRecord::new("C777", "1 x $5.00"));
    }

    // Test 3: Unknown extension is rejected
    #[tokio::test]
    async fn test_unsupported_format() {
        let file = write_temp(".csv", "identity_key,cart_value\nA123,49.99\n");

        let result = FileSource::new(file.path()).fetch().await;

        assert!(matches!(result, Err(SourceError::UnsupportedFormat(_))));
    }

    // Test 4: Missing file is an IO error
    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileSource::new(dir.path().join("missing.json")).fetch().await;

        assert!(matches!(result, Err(SourceError::Io(_))));
    }

    // Test 5: Malformed JSON is a parse error
    #[tokio::test]
    async fn test_malformed_json() {
        let file = write_temp(".json", r#"[{"identity_key": "A123"}]"#);

        let result = FileSource::new(file.path()).fetch().await;

        assert!(matches!(result, Err(SourceError::Parse(_))));
    }

    // Test 6: Format detection
    #[test]
    fn test_format_from_path() {
        assert_eq!(
            RecordFormat::from_path(Path::new("carts.JSON")).unwrap(),
            RecordFormat::Json
        );
        assert_eq!(
            RecordFormat::from_path(Path::new("carts.yml")).unwrap(),
            RecordFormat::Yaml
        );
        assert!(RecordFormat::from_path(Path::new("carts")).is_err());
    }
}
