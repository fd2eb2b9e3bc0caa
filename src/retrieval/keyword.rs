//! Keyword ranking by substring occurrence counts

use crate::storage::{ArticleFull, ArticleId};
use serde::Serialize;

/// An article with at least one keyword occurrence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordHit {
    pub article_id: ArticleId,
    pub title: String,
    pub text: String,
    /// Sum of occurrence counts over all keywords
    pub match_count: usize,
    /// Keywords that occurred at least once, in keyword order
    pub matched_keywords: Vec<String>,
}

/// Rank full articles by total keyword occurrences, case-insensitively
pub fn keyword_rank(articles: &[ArticleFull], keywords: &[String], top_k: usize) -> Vec<KeywordHit> {
    let needles: Vec<(&String, String)> = keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| (k, k.to_lowercase()))
        .collect();

    if needles.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let mut hits: Vec<KeywordHit> = articles
        .iter()
        .filter_map(|article| {
            let haystack = article.text.to_lowercase();
            let mut match_count = 0;
            let mut matched_keywords = Vec::new();

            for (keyword, needle) in &needles {
                let count = haystack.matches(needle.as_str()).count();
                if count > 0 {
                    match_count += count;
                    matched_keywords.push((*keyword).clone());
                }
            }

            (match_count > 0).then(|| KeywordHit {
                article_id: article.id.clone(),
                title: article.title.clone(),
                text: article.text.clone(),
                match_count,
                matched_keywords,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.match_count.cmp(&a.match_count));
    hits.truncate(top_k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, text: &str) -> ArticleFull {
        ArticleFull {
            id: ArticleId::from(id),
            title: format!("Title {}", id),
            text: text.to_string(),
        }
    }

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_counts_occurrences_case_insensitively() {
        let articles = vec![
            article("1", "Tea, tea and more TEA. Chai is tea."),
            article("2", "Coffee only."),
            article("3", "Chai latte"),
        ];

        let hits = keyword_rank(&articles, &keywords(&["tea", "Chai"]), 10);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].article_id.as_str(), "1");
        assert_eq!(hits[0].match_count, 5);
        assert_eq!(hits[0].matched_keywords, vec!["tea", "Chai"]);
        assert_eq!(hits[1].match_count, 1);
        assert_eq!(hits[1].matched_keywords, vec!["Chai"]);
    }

    #[test]
    fn test_zero_match_articles_excluded() {
        let articles = vec![article("1", "nothing relevant"), article("2", "tofu")];
        let hits = keyword_rank(&articles, &keywords(&["tofu", "miso"]), 10);

        assert!(hits.iter().all(|h| h.article_id.as_str() != "1"));
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_non_overlapping_substring_counts() {
        let hits = keyword_rank(&[article("1", "aaaa")], &keywords(&["aa"]), 10);
        assert_eq!(hits[0].match_count, 2);
    }

    #[test]
    fn test_truncated_and_stable() {
        let articles: Vec<ArticleFull> = (0..6).map(|i| article(&i.to_string(), "beer")).collect();
        let hits = keyword_rank(&articles, &keywords(&["beer"]), 3);

        let ids: Vec<&str> = hits.iter().map(|h| h.article_id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_no_keywords() {
        assert!(keyword_rank(&[article("1", "x")], &[], 5).is_empty());
        assert!(keyword_rank(&[article("1", "x")], &keywords(&[""]), 5).is_empty());
    }
}
