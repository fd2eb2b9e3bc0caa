//! Hybrid text retrieval
//!
//! A question is expanded into paraphrases and keywords, the paraphrases are
//! embedded and scored against every corpus chunk (best match wins), the
//! keywords are counted in every full article, and the two ranked lists are
//! fused into the text evidence for synthesis.

mod expansion;
mod fusion;
mod hybrid;
mod keyword;
mod semantic;

pub use expansion::{normalize_keywords, ExpandedQuery, QueryExpander};
pub use fusion::{fuse_evidence, TextEvidence, NO_TEXT_EVIDENCE};
pub use hybrid::{render_trace, HybridSearcher, SearchOutcome};
pub use keyword::{keyword_rank, KeywordHit};
pub use semantic::{cosine_similarity, semantic_rank, SemanticHit};
