//! Reduces a ranked result set into the bounded bundle returned to callers.
//!
//! Only the top [`AGGREGATE_LIMIT`] results feed the summary, highlights,
//! citations and snippets. Source counts cover the full ranked set.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::types::{
    Citation, CollectedSnippet, GatherContextResult, GatherStats, RankedResult, Source,
};

/// Ranked results considered for the bundle.
pub const AGGREGATE_LIMIT: usize = 10;
pub const MAX_HIGHLIGHTS: usize = 5;
pub const MAX_CITATIONS: usize = 5;
pub const MAX_SNIPPETS: usize = 5;

const TOP_HIGHLIGHTS: usize = 3;
const VERSION_HIGHLIGHTS: usize = 2;
const HIGH_RELEVANCE_HIGHLIGHTS: usize = 2;
const HIGH_RELEVANCE_SCORE: f64 = 70.0;
const NAMED_TOP_RESULT_SCORE: f64 = 80.0;
const CITATION_SNIPPET_CHARS: usize = 200;
const MIN_PARAGRAPH_CHARS: usize = 50;
const MIN_SNIPPET_CHARS: usize = 20;
const CODE_PLACEHOLDER: &str = "[code]";

/// Summary used when nothing was found.
pub const NO_RESULTS_SUMMARY: &str = "No results found.";

/// Build the bundle for `ranked`, which must already be sorted.
pub fn aggregate(
    ranked: &[RankedResult],
    elapsed_ms: u64,
    cache_hits: u64,
    incomplete_sources: Option<Vec<Source>>,
) -> GatherContextResult {
    let top = &ranked[..ranked.len().min(AGGREGATE_LIMIT)];

    GatherContextResult {
        summary: generate_summary(top),
        highlights: extract_highlights(top),
        citations: build_citations(top),
        snippets: collect_code_snippets(top),
        stats: GatherStats {
            elapsed_ms,
            source_counts: count_by_source(ranked),
            cache_hits,
            incomplete_sources: incomplete_sources.filter(|s| !s.is_empty()),
        },
    }
}

/// One templated sentence per triggered clause.
pub fn generate_summary(results: &[RankedResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS_SUMMARY.to_owned();
    }

    let mut sources: Vec<Source> = Vec::new();
    for r in results {
        if !sources.contains(&r.result.source) {
            sources.push(r.result.source);
        }
    }
    let source_names: Vec<&str> = sources.iter().map(Source::name).collect();

    let mut summary = format!(
        "Found {} {} from {}.",
        results.len(),
        plural(results.len(), "result", "results"),
        source_names.join(", ")
    );

    let accepted = results.iter().filter(|r| r.result.accepted()).count();
    if accepted > 0 {
        summary.push_str(&format!(
            " {accepted} {} accepted or verified.",
            plural(accepted, "is", "are")
        ));
    }

    if let Some(best) = results.first().filter(|r| r.final_score > NAMED_TOP_RESULT_SCORE) {
        summary.push_str(&format!(
            " Top match: \"{}\" (score {}).",
            best.result.title,
            best.final_score.round() as i64
        ));
    }

    let mut versions: Vec<&str> = Vec::new();
    for r in results {
        if let Some(v) = r.result.version.as_deref() {
            if !versions.contains(&v) {
                versions.push(v);
            }
        }
    }
    if !versions.is_empty() {
        summary.push_str(&format!(" Versions mentioned: {}.", versions.join(", ")));
    }

    summary
}

/// Up to five highlight lines, first match wins, no repeated titles.
pub fn extract_highlights(results: &[RankedResult]) -> Vec<String> {
    let mut highlights = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for r in results.iter().take(TOP_HIGHLIGHTS) {
        if seen.insert(r.result.title.as_str()) {
            let marker = if r.result.accepted() { "✓" } else { "•" };
            highlights.push(format!("{marker} {}", r.result.title));
        }
    }

    let versioned = results
        .iter()
        .filter_map(|r| r.result.version.as_deref().map(|v| (r, v)))
        .filter(|(r, _)| !seen.contains(r.result.title.as_str()))
        .take(VERSION_HIGHLIGHTS)
        .collect::<Vec<_>>();
    for (r, version) in versioned {
        seen.insert(r.result.title.as_str());
        highlights.push(format!("[v{version}] {}", r.result.title));
    }

    let relevant = results
        .iter()
        .filter(|r| r.final_score > HIGH_RELEVANCE_SCORE)
        .filter(|r| !seen.contains(r.result.title.as_str()))
        .take(HIGH_RELEVANCE_HIGHLIGHTS)
        .collect::<Vec<_>>();
    for r in relevant {
        seen.insert(r.result.title.as_str());
        highlights.push(format!("★ {}", r.result.title));
    }

    highlights.truncate(MAX_HIGHLIGHTS);
    highlights
}

/// Citations for the top five results.
pub fn build_citations(results: &[RankedResult]) -> Vec<Citation> {
    results
        .iter()
        .take(MAX_CITATIONS)
        .map(|r| Citation {
            title: r.result.title.clone(),
            url: r.result.url.clone(),
            source: r.result.source,
            author: r.result.author.clone(),
            timestamp: r.result.created_at.to_rfc3339(),
            score: r.final_score.round() as i64,
            version: r.result.version.clone(),
            snippet: text_snippet(&r.result.content),
        })
        .collect()
}

/// Short prose excerpt of `content` with fenced code replaced.
///
/// Picks the first paragraph longer than 50 characters and truncates it to
/// 200 characters. Falls back to the first 200 characters of the raw
/// content.
pub fn text_snippet(content: &str) -> String {
    let stripped = match fenced_code() {
        Some(re) => re.replace_all(content, CODE_PLACEHOLDER).into_owned(),
        None => content.to_owned(),
    };

    let paragraph = split_paragraphs(&stripped)
        .into_iter()
        .find(|p| p.chars().count() > MIN_PARAGRAPH_CHARS);

    match paragraph {
        Some(p) => truncate_chars(p, CITATION_SNIPPET_CHARS, true),
        None => truncate_chars(content, CITATION_SNIPPET_CHARS, false),
    }
}

/// Up to five distinct code snippets in ranked order.
pub fn collect_code_snippets(results: &[RankedResult]) -> Vec<CollectedSnippet> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut snippets = Vec::new();

    'outer: for r in results {
        for snippet in &r.result.code_snippets {
            let code = snippet.code.trim();
            if code.chars().count() <= MIN_SNIPPET_CHARS {
                continue;
            }
            if !seen.insert(code.to_owned()) {
                continue;
            }
            snippets.push(CollectedSnippet {
                language: snippet.language.clone(),
                code: code.to_owned(),
                source: r.result.source,
                url: r.result.url.clone(),
            });
            if snippets.len() >= MAX_SNIPPETS {
                break 'outer;
            }
        }
    }

    snippets
}

/// Result count per source over the full ranked set.
pub fn count_by_source(ranked: &[RankedResult]) -> BTreeMap<Source, usize> {
    let mut counts = BTreeMap::new();
    for r in ranked {
        *counts.entry(r.result.source).or_insert(0) += 1;
    }
    counts
}

fn split_paragraphs(text: &str) -> Vec<&str> {
    match blank_line() {
        Some(re) => re.split(text).map(str::trim).filter(|p| !p.is_empty()).collect(),
        None => vec![text.trim()],
    }
}

fn truncate_chars(text: &str, max_chars: usize, ellipsis: bool) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) if ellipsis => format!("{}...", text[..idx].trim_end()),
        Some((idx, _)) => text[..idx].to_owned(),
        None => text.to_owned(),
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}

fn fenced_code() -> Option<&'static Regex> {
    static FENCED: OnceLock<Option<Regex>> = OnceLock::new();
    FENCED
        .get_or_init(|| Regex::new(r"(?s)```.*?```").ok())
        .as_ref()
}

fn blank_line() -> Option<&'static Regex> {
    static BLANK: OnceLock<Option<Regex>> = OnceLock::new();
    BLANK.get_or_init(|| Regex::new(r"\n\s*\n").ok()).as_ref()
}
