use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::path::Path;

/// A single record (prospective row) from the input file
///
/// Keys keep the order they appear in the file.
pub type Record = Map<String, Value>;

/// Read the input file and decode it into records
///
/// The file must hold a JSON array of objects with at least one element.
pub async fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.with_context(|| {
        format!(
            "Failed to open input file for reading: {}",
            path.display()
        )
    })?;

    decode_records(&bytes)
}

/// Decode a JSON document into records
pub fn decode_records(bytes: &[u8]) -> Result<Vec<Record>> {
    let records: Vec<Record> =
        serde_json::from_slice(bytes).context("Failed to decode input data")?;

    if records.is_empty() {
        bail!("No rows in the input file");
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_decode_array_of_objects() {
        let records = decode_records(br#"[{"id": 1, "name": "a"}, {"id": 2}]"#).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], Value::from("a"));
        assert_eq!(records[1].len(), 1);
    }

    #[test]
    fn test_decode_preserves_key_order() {
        let records = decode_records(br#"[{"zeta": 1, "alpha": 2, "mid": 3}]"#).unwrap();

        let keys: Vec<&str> = records[0].keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_decode_rejects_empty_array() {
        let err = decode_records(b"[]").unwrap_err();
        assert!(err.to_string().contains("No rows"));
    }

    #[test]
    fn test_decode_rejects_non_array_documents() {
        // Table-driven test: (input, description)
        let test_cases: [(&[u8], &str); 4] = [
            (br#"{"id": 1}"#, "top-level object"),
            (b"[1, 2, 3]", "array of numbers"),
            (b"not json", "garbage"),
            (br#"[{"id": 1}"#, "truncated array"),
        ];

        for (input, description) in test_cases {
            let err = decode_records(input).unwrap_err();
            assert!(
                err.to_string().contains("Failed to decode input data"),
                "Failed: {} - got '{}'",
                description,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_read_records_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"[{"id": 1, "meta": {"a": true}}]"#).unwrap();
        file.flush().unwrap();

        let records = read_records(file.path()).await.unwrap();

        assert_eq!(records.len(), 1);
        assert!(records[0]["meta"].is_object());
    }

    #[tokio::test]
    async fn test_read_records_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");

        let err = read_records(&missing).await.unwrap_err();
        assert!(err.to_string().contains("Failed to open input file"));
    }
}
