//! GitHub issue search via the REST `/search/issues` endpoint.
//!
//! Unauthenticated. Repository scope and excluded labels become search
//! qualifiers; prioritised labels reorder the returned page.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::extract::{detect_version, fenced_code_blocks};
use super::url_normalize::normalize_url;
use super::with_exclusions;
use crate::analyzer::SearchStrategy;
use crate::error::Result;
use crate::http;
use crate::source::SourceAdapter;
use crate::types::{NormalizedResult, ProblemCategory, Source};

const MAX_PER_PAGE: usize = 100;

/// GitHub issue search adapter.
#[derive(Debug, Clone)]
pub struct GitHubAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl SourceAdapter for GitHubAdapter {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        strategy: &SearchStrategy,
        _category: ProblemCategory,
    ) -> Result<Vec<NormalizedResult>> {
        tracing::trace!(query, "GitHub search");

        let q = build_query(query, strategy);
        let per_page = max_results.clamp(1, MAX_PER_PAGE).to_string();
        let sort = strategy.sort.as_deref().unwrap_or("reactions");

        let request = self
            .client
            .get(format!("{}/search/issues", self.base_url))
            .header("X-GitHub-Api-Version", "2022-11-28")
            .query(&[
                ("q", q.as_str()),
                ("sort", sort),
                ("order", "desc"),
                ("per_page", per_page.as_str()),
            ]);
        let response: SearchResponse = http::get_json(Source::GitHub, request).await?;

        let mut results = parse_items(response.items);
        if let Some(min) = strategy.min_score {
            results.retain(|r| r.score >= min);
        }
        prioritise(&mut results, &strategy.prioritize_labels);
        results.truncate(max_results);

        tracing::debug!(count = results.len(), "GitHub results parsed");
        Ok(results)
    }

    fn source(&self) -> Source {
        Source::GitHub
    }
}

/// Query text plus `is:issue`, `repo:` and `-label:` qualifiers.
///
/// Multiple `repo:` qualifiers are OR-ed by GitHub.
pub(crate) fn build_query(query: &str, strategy: &SearchStrategy) -> String {
    let mut q = with_exclusions(query, &strategy.exclude_terms);
    q.push_str(" is:issue");
    for repo in &strategy.repositories {
        q.push_str(&format!(" repo:{repo}"));
    }
    for label in &strategy.exclude_labels {
        q.push_str(&format!(" -label:\"{label}\""));
    }
    q
}

/// Stable partition: results carrying a prioritised label first.
fn prioritise(results: &mut [NormalizedResult], labels: &[String]) {
    if labels.is_empty() {
        return;
    }
    results.sort_by_key(|r| {
        !r.tags
            .iter()
            .any(|t| labels.iter().any(|l| l.eq_ignore_ascii_case(t)))
    });
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    title: String,
    html_url: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    comments: i64,
    #[serde(default)]
    reactions: Option<Reactions>,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Reactions {
    #[serde(default)]
    total_count: i64,
}

pub(crate) fn parse_items(items: Vec<serde_json::Value>) -> Vec<NormalizedResult> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Issue>(item) {
            Ok(issue) => Some(normalise(issue)),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed GitHub issue");
                None
            }
        })
        .collect()
}

fn normalise(issue: Issue) -> NormalizedResult {
    let body = issue.body.unwrap_or_default();
    let tags: Vec<String> = issue.labels.into_iter().map(|l| l.name).collect();
    let reactions = issue.reactions.map_or(0, |r| r.total_count);

    NormalizedResult {
        version: detect_version(&issue.title, &tags),
        title: issue.title,
        url: normalize_url(&issue.html_url),
        source: Source::GitHub,
        author: issue.user.map_or_else(|| "ghost".into(), |u| u.login),
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        score: reactions,
        code_snippets: fenced_code_blocks(&body),
        content: body,
        tags,
        is_accepted: Some(issue.state.eq_ignore_ascii_case("closed")),
        vote_count: Some(reactions + issue.comments),
    }
}
