//! Storage layer for hyqa
//!
//! Read-only access to the prepared dataset: schema metadata document,
//! article corpus (chunked-with-vectors and raw) and the SQLite database.

pub mod corpus;
pub mod database;
pub mod schema;

use crate::error::{HyqaError, Result};
use std::path::Path;

pub use corpus::{ArticleChunk, ArticleFull, ArticleId, Corpus};
pub use database::{Cell, RelationalStore, RowSet, SqliteStore, StoreError};
pub use schema::{SchemaMetadata, TableMetadata};

/// Read a data file, decompressing it when the name ends in `.zst`
pub fn read_document(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(HyqaError::Resource {
            path: path.to_path_buf(),
            message: "File not found (run the data preparation step first)".to_string(),
        });
    }

    let data = std::fs::read(path).map_err(|e| HyqaError::Io {
        source: e,
        context: format!("Failed to read {}", path.display()),
    })?;

    let compressed = path.extension().map(|ext| ext == "zst").unwrap_or(false);
    if !compressed {
        return Ok(data);
    }

    zstd::decode_all(&data[..]).map_err(|e| HyqaError::Io {
        source: e,
        context: format!("Failed to decompress {}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_plain_and_compressed() {
        let temp = TempDir::new().unwrap();
        let payload = br#"[{"id": 1, "title": "t", "text": "x"}]"#;

        let plain = temp.path().join("articles.json");
        std::fs::write(&plain, payload).unwrap();
        assert_eq!(read_document(&plain).unwrap(), payload.to_vec());

        let packed = temp.path().join("articles.json.zst");
        std::fs::write(&packed, zstd::encode_all(&payload[..], 3).unwrap()).unwrap();
        assert_eq!(read_document(&packed).unwrap(), payload.to_vec());
    }

    #[test]
    fn test_missing_document() {
        let err = read_document(Path::new("/nonexistent/chunks.json")).unwrap_err();
        assert!(matches!(err, HyqaError::Resource { .. }));
    }
}
