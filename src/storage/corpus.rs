//! Article corpus
//!
//! Two parallel views of the same article set, both produced offline:
//! chunks with embedding vectors for semantic ranking, and full raw
//! articles for keyword ranking.

use crate::error::{HyqaError, Result};
use crate::storage::read_document;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

/// Article identifier
///
/// Source datasets use either numeric or string ids; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for ArticleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => ArticleId(s),
            RawId::Signed(n) => ArticleId(n.to_string()),
            RawId::Unsigned(n) => ArticleId(n.to_string()),
        })
    }
}

/// A chunk of an article with its precomputed embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleChunk {
    pub chunk_id: u64,
    pub article_id: ArticleId,
    #[serde(rename = "article_title", alias = "title")]
    pub title: String,
    pub chunk_index: usize,
    pub text: String,
    #[serde(alias = "embedding_vector")]
    pub embedding: Vec<f32>,
}

/// A full article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleFull {
    pub id: ArticleId,
    pub title: String,
    pub text: String,
}

/// Both corpus views, immutable after loading
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub chunks: Vec<ArticleChunk>,
    pub articles: Vec<ArticleFull>,
}

impl Corpus {
    pub fn new(chunks: Vec<ArticleChunk>, articles: Vec<ArticleFull>) -> Self {
        Self { chunks, articles }
    }

    /// Load the chunked and raw corpus files
    pub fn load(chunks_path: &Path, articles_path: &Path) -> Result<Self> {
        let chunks: Vec<ArticleChunk> = parse_array(chunks_path)?;
        tracing::info!("Loaded {} article chunks", chunks.len());

        let articles: Vec<ArticleFull> = parse_array(articles_path)?;
        tracing::info!("Loaded {} full articles", articles.len());

        let corpus = Self::new(chunks, articles);
        if let Err(message) = corpus.check_dimensions() {
            return Err(HyqaError::Resource {
                path: chunks_path.to_path_buf(),
                message,
            });
        }

        if corpus.chunks.is_empty() || corpus.articles.is_empty() {
            tracing::warn!("Article corpus is empty, text search will return nothing");
        }

        Ok(corpus)
    }

    /// Embedding dimension shared by every chunk
    pub fn dimension(&self) -> Option<usize> {
        self.chunks.first().map(|c| c.embedding.len())
    }

    fn check_dimensions(&self) -> std::result::Result<(), String> {
        let Some(expected) = self.dimension() else {
            return Ok(());
        };

        match self.chunks.iter().find(|c| c.embedding.len() != expected) {
            Some(chunk) => Err(format!(
                "Chunk {} has a {}-dimensional embedding, expected {}",
                chunk.chunk_id,
                chunk.embedding.len(),
                expected
            )),
            None => Ok(()),
        }
    }
}

fn parse_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let data = read_document(path)?;
    serde_json::from_slice(&data).map_err(|e| HyqaError::Resource {
        path: path.to_path_buf(),
        message: format!("Invalid corpus document: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CHUNKS: &str = r#"[
        {"chunk_id": 0, "article_id": 17, "article_title": "Tofu", "chunk_index": 0,
         "text": "Tofu is made from soybeans.", "embedding": [0.1, 0.2]},
        {"chunk_id": 1, "article_id": "a-18", "title": "Chai", "chunk_index": 0,
         "text": "Chai is spiced tea.", "embedding_vector": [0.3, 0.4]}
    ]"#;

    const ARTICLES: &str = r#"[
        {"id": 17, "title": "Tofu", "text": "Tofu is made from soybeans.", "length": 27},
        {"id": "a-18", "title": "Chai", "text": "Chai is spiced tea."}
    ]"#;

    fn write(dir: &TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_load_mixed_id_types() {
        let temp = TempDir::new().unwrap();
        let chunks = write(&temp, "chunks.json", CHUNKS);
        let articles = write(&temp, "articles.json", ARTICLES);

        let corpus = Corpus::load(&chunks, &articles).unwrap();
        assert_eq!(corpus.chunks[0].article_id, ArticleId::from("17"));
        assert_eq!(corpus.chunks[1].title, "Chai");
        assert_eq!(corpus.chunks[1].embedding, vec![0.3, 0.4]);
        assert_eq!(corpus.articles[1].id.as_str(), "a-18");
        assert_eq!(corpus.dimension(), Some(2));
    }

    #[test]
    fn test_inconsistent_dimensions_rejected() {
        let temp = TempDir::new().unwrap();
        let chunks = write(
            &temp,
            "chunks.json",
            r#"[
                {"chunk_id": 0, "article_id": 1, "article_title": "A", "chunk_index": 0, "text": "a", "embedding": [1.0, 0.0]},
                {"chunk_id": 1, "article_id": 1, "article_title": "A", "chunk_index": 1, "text": "b", "embedding": [1.0]}
            ]"#,
        );
        let articles = write(&temp, "articles.json", ARTICLES);

        let err = Corpus::load(&chunks, &articles).unwrap_err();
        assert!(matches!(err, HyqaError::Resource { .. }));
    }

    #[test]
    fn test_invalid_document() {
        let temp = TempDir::new().unwrap();
        let chunks = write(&temp, "chunks.json", "{not json");
        let articles = write(&temp, "articles.json", ARTICLES);

        assert!(Corpus::load(&chunks, &articles).is_err());
    }
}
