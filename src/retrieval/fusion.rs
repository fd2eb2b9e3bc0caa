//! Evidence fusion for the text channel
//!
//! Every semantic hit contributes its text. The keyword channel adds at most
//! one article: the highest-ranked keyword hit whose article id is not
//! already among the semantic hits.

use super::{KeywordHit, SemanticHit};
use crate::storage::ArticleId;
use ahash::AHashSet;
use serde::Serialize;

/// Evidence handed to synthesis when both channels came back empty
pub const NO_TEXT_EVIDENCE: &str = "No text information available";

/// Ordered evidence entries for the synthesis prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextEvidence {
    pub entries: Vec<String>,
    /// The keyword-only article that was added, if any
    pub keyword_article: Option<ArticleId>,
}

impl TextEvidence {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries joined one per line, or the empty-evidence marker
    pub fn to_prompt(&self) -> String {
        if self.entries.is_empty() {
            NO_TEXT_EVIDENCE.to_string()
        } else {
            self.entries.join("\n")
        }
    }
}

fn entry(title: &str, text: &str) -> String {
    format!("Title: {}, Text: {}", title, text)
}

pub fn fuse_evidence(semantic: &[SemanticHit], keyword: &[KeywordHit]) -> TextEvidence {
    let mut entries: Vec<String> = semantic.iter().map(|h| entry(&h.title, &h.text)).collect();

    let semantic_ids: AHashSet<&ArticleId> = semantic.iter().map(|h| &h.article_id).collect();
    let novel = keyword
        .iter()
        .find(|h| !semantic_ids.contains(&h.article_id));

    if let Some(hit) = novel {
        entries.push(entry(&hit.title, &hit.text));
    }

    TextEvidence {
        entries,
        keyword_article: novel.map(|h| h.article_id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semantic(id: &str) -> SemanticHit {
        SemanticHit {
            article_id: ArticleId::from(id),
            title: format!("S{}", id),
            text: format!("semantic {}", id),
            similarity: 0.5,
        }
    }

    fn keyword(id: &str) -> KeywordHit {
        KeywordHit {
            article_id: ArticleId::from(id),
            title: format!("K{}", id),
            text: format!("keyword {}", id),
            match_count: 1,
            matched_keywords: vec!["x".to_string()],
        }
    }

    #[test]
    fn test_adds_first_novel_keyword_hit_only() {
        let evidence = fuse_evidence(
            &[semantic("1"), semantic("2")],
            &[keyword("2"), keyword("7"), keyword("9")],
        );

        assert_eq!(
            evidence.entries,
            vec![
                "Title: S1, Text: semantic 1",
                "Title: S2, Text: semantic 2",
                "Title: K7, Text: keyword 7",
            ]
        );
        assert_eq!(evidence.keyword_article, Some(ArticleId::from("7")));
    }

    #[test]
    fn test_no_duplicate_of_semantic_article() {
        let evidence = fuse_evidence(&[semantic("1")], &[keyword("1")]);

        assert_eq!(evidence.entries.len(), 1);
        assert!(evidence.keyword_article.is_none());
    }

    #[test]
    fn test_keyword_only() {
        let evidence = fuse_evidence(&[], &[keyword("4"), keyword("5")]);
        assert_eq!(evidence.to_prompt(), "Title: K4, Text: keyword 4");
    }

    #[test]
    fn test_empty_marker() {
        let evidence = fuse_evidence(&[], &[]);
        assert!(evidence.is_empty());
        assert_eq!(evidence.to_prompt(), NO_TEXT_EVIDENCE);
    }
}
