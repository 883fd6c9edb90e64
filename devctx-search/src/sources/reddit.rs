//! Reddit thread search via the public JSON listing endpoints.
//!
//! Searches `/r/a+b/search.json` restricted to the strategy's subreddits,
//! or site-wide `/search.json` when there are none.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::extract::{decode_entities, detect_version, fenced_code_blocks};
use super::url_normalize::normalize_url;
use super::with_exclusions;
use crate::analyzer::SearchStrategy;
use crate::error::Result;
use crate::http;
use crate::source::SourceAdapter;
use crate::types::{NormalizedResult, ProblemCategory, Source};

const MAX_LIMIT: usize = 100;
const PERMALINK_BASE: &str = "https://www.reddit.com";

/// Reddit search adapter.
#[derive(Debug, Clone)]
pub struct RedditAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl RedditAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn search_url(&self, subreddits: &[String]) -> String {
        if subreddits.is_empty() {
            format!("{}/search.json", self.base_url)
        } else {
            format!("{}/r/{}/search.json", self.base_url, subreddits.join("+"))
        }
    }
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        strategy: &SearchStrategy,
        _category: ProblemCategory,
    ) -> Result<Vec<NormalizedResult>> {
        tracing::trace!(query, "Reddit search");

        let q = with_exclusions(query, &strategy.exclude_terms);
        let limit = max_results.clamp(1, MAX_LIMIT).to_string();
        let sort = strategy.sort.as_deref().unwrap_or("relevance");
        let mut params: Vec<(&str, &str)> = vec![
            ("q", q.as_str()),
            ("sort", sort),
            ("t", "all"),
            ("limit", &limit),
            ("raw_json", "1"),
        ];
        if !strategy.subreddits.is_empty() {
            params.push(("restrict_sr", "1"));
        }

        let request = self
            .client
            .get(self.search_url(&strategy.subreddits))
            .query(&params);
        let listing: Listing = http::get_json(Source::Reddit, request).await?;

        let mut results = parse_children(listing.data.children, &strategy.exclude_flairs);
        if let Some(min) = strategy.min_score {
            results.retain(|r| r.score >= min);
        }
        results.truncate(max_results);

        tracing::debug!(count = results.len(), "Reddit results parsed");
        Ok(results)
    }

    fn source(&self) -> Source {
        Source::Reddit
    }
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    permalink: String,
    created_utc: f64,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    subreddit: Option<String>,
    #[serde(default)]
    link_flair_text: Option<String>,
    #[serde(default)]
    num_comments: i64,
    /// `false`, or the edit time in epoch seconds.
    #[serde(default)]
    edited: serde_json::Value,
}

/// Normalise listing children, dropping malformed posts and posts whose
/// flair is in `exclude_flairs`.
pub(crate) fn parse_children(
    children: Vec<serde_json::Value>,
    exclude_flairs: &[String],
) -> Vec<NormalizedResult> {
    children
        .into_iter()
        .filter_map(|child| match serde_json::from_value::<Child>(child) {
            Ok(child) => Some(child.data),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed Reddit post");
                None
            }
        })
        .filter(|post| {
            let flair = post.link_flair_text.as_deref().unwrap_or_default();
            !exclude_flairs.iter().any(|f| f.eq_ignore_ascii_case(flair.trim()))
        })
        .filter_map(normalise)
        .collect()
}

fn normalise(post: Post) -> Option<NormalizedResult> {
    let Some(created_at) = DateTime::<Utc>::from_timestamp(post.created_utc as i64, 0) else {
        tracing::warn!(created_utc = post.created_utc, "skipping Reddit post with bad timestamp");
        return None;
    };
    let updated_at = post
        .edited
        .as_f64()
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts as i64, 0));

    let solved = post.link_flair_text.as_deref().is_some_and(flair_marks_solved);

    let mut tags: Vec<String> = Vec::new();
    tags.extend(post.subreddit.clone());
    tags.extend(post.link_flair_text.clone());

    let title = decode_entities(&post.title);
    Some(NormalizedResult {
        version: detect_version(&title, &[]),
        title,
        url: normalize_url(&format!("{PERMALINK_BASE}{}", post.permalink)),
        source: Source::Reddit,
        author: post.author.unwrap_or_else(|| "[deleted]".into()),
        created_at,
        updated_at,
        score: post.score,
        code_snippets: fenced_code_blocks(&post.selftext),
        content: post.selftext,
        tags,
        is_accepted: solved.then_some(true),
        vote_count: Some(post.score + post.num_comments),
    })
}

/// True when the flair reads as resolved: a whole `solved`/`resolved`
/// word that is not negated (`Unsolved`, `Not Solved`).
fn flair_marks_solved(flair: &str) -> bool {
    let lower = flair.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    words.iter().enumerate().any(|(i, word)| {
        matches!(*word, "solved" | "resolved")
            && !(i > 0 && matches!(words[i - 1], "not" | "never"))
    })
}
