//! Stack Overflow via the Stack Exchange API 2.3.
//!
//! Uses `/search/advanced` with the built-in `withbody` filter so question
//! bodies arrive in the same response. Bodies are HTML.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::extract::{decode_entities, detect_version, html_code_blocks, html_to_text};
use super::url_normalize::normalize_url;
use crate::analyzer::SearchStrategy;
use crate::error::Result;
use crate::http;
use crate::source::SourceAdapter;
use crate::types::{NormalizedResult, ProblemCategory, Source};

/// Largest page the API serves.
const MAX_PAGE_SIZE: usize = 100;

/// Stack Exchange search adapter scoped to `site=stackoverflow`.
#[derive(Debug, Clone)]
pub struct StackOverflowAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl StackOverflowAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl SourceAdapter for StackOverflowAdapter {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        strategy: &SearchStrategy,
        _category: ProblemCategory,
    ) -> Result<Vec<NormalizedResult>> {
        tracing::trace!(query, "Stack Overflow search");

        let page_size = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let sort = strategy.sort.as_deref().unwrap_or("relevance");
        let tagged = strategy.tags.join(";");

        let mut params: Vec<(&str, &str)> = vec![
            ("order", "desc"),
            ("sort", sort),
            ("q", query),
            ("site", "stackoverflow"),
            ("filter", "withbody"),
            ("pagesize", &page_size),
        ];
        if !tagged.is_empty() {
            params.push(("tagged", &tagged));
        }
        if strategy.require_accepted {
            params.push(("accepted", "True"));
        }

        let request = self
            .client
            .get(format!("{}/search/advanced", self.base_url))
            .query(&params);
        let response: SearchResponse = http::get_json(Source::StackOverflow, request).await?;

        if let Some(remaining) = response.quota_remaining {
            tracing::debug!(quota_remaining = remaining, "Stack Exchange quota");
        }

        let mut results = parse_items(response.items);
        if let Some(min) = strategy.min_score {
            results.retain(|r| r.score >= min);
        }
        results.truncate(max_results);

        tracing::debug!(count = results.len(), "Stack Overflow results parsed");
        Ok(results)
    }

    fn source(&self) -> Source {
        Source::StackOverflow
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
    #[serde(default)]
    quota_remaining: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Question {
    title: String,
    link: String,
    creation_date: i64,
    #[serde(default)]
    last_activity_date: Option<i64>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    body: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    owner: Option<Owner>,
    #[serde(default)]
    accepted_answer_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    #[serde(default)]
    display_name: Option<String>,
}

/// Normalise raw `items`, skipping records that do not fit.
pub(crate) fn parse_items(items: Vec<serde_json::Value>) -> Vec<NormalizedResult> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Question>(item) {
            Ok(question) => normalise(question),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed Stack Overflow item");
                None
            }
        })
        .collect()
}

fn normalise(q: Question) -> Option<NormalizedResult> {
    let Some(created_at) = DateTime::<Utc>::from_timestamp(q.creation_date, 0) else {
        tracing::warn!(creation_date = q.creation_date, "skipping Stack Overflow item with bad timestamp");
        return None;
    };
    let title = decode_entities(&q.title);

    Some(NormalizedResult {
        version: detect_version(&title, &q.tags),
        url: normalize_url(&q.link),
        source: Source::StackOverflow,
        author: q
            .owner
            .and_then(|o| o.display_name)
            .map(|name| decode_entities(&name))
            .unwrap_or_else(|| "anonymous".into()),
        created_at,
        updated_at: q
            .last_activity_date
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        score: q.score,
        content: html_to_text(&q.body),
        code_snippets: html_code_blocks(&q.body),
        tags: q.tags,
        is_accepted: Some(q.accepted_answer_id.is_some()),
        vote_count: Some(q.score),
        title,
    })
}
