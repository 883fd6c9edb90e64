//! Per-source search strategy derivation.
//!
//! A [`SearchStrategy`] is a bundle of advisory hints. Adapters apply the
//! fields that make sense for their source and ignore the rest.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::patterns::{
    lookup, DEFAULT_SUBREDDITS, FILLER_WORDS, LOW_SIGNAL_FLAIRS, STACKOVERFLOW_TAGS, SUBREDDITS,
    TECHNOLOGIES, TECH_REPOSITORIES,
};
use crate::types::{ProblemCategory, Source};

/// Search hints for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStrategy {
    /// Replacement query text. `None` means use the original query.
    pub query: Option<String>,
    /// Words or phrases results must not contain (GitHub, Reddit).
    pub exclude_terms: Vec<String>,
    /// Issue labels to rank first (GitHub).
    pub prioritize_labels: Vec<String>,
    /// Issue labels to exclude (GitHub).
    pub exclude_labels: Vec<String>,
    /// Repositories to scope the search to (GitHub).
    pub repositories: Vec<String>,
    /// Tags to filter on (Stack Overflow).
    pub tags: Vec<String>,
    /// Source-specific sort key.
    pub sort: Option<String>,
    /// Only return results with an accepted answer (Stack Overflow).
    pub require_accepted: bool,
    /// Subreddits to search (Reddit).
    pub subreddits: Vec<String>,
    /// Post flairs to exclude (Reddit).
    pub exclude_flairs: Vec<String>,
    /// Minimum source-native score for a result to be kept.
    pub min_score: Option<i64>,
}

/// Derive one strategy per source from the classified query.
///
/// Query overrides start from the query with its conversational lead-in
/// removed. Stack Overflow and GitHub drop technology names already
/// covered by a tag or repository scope and keep every version; Reddit
/// keeps technology names and drops versions.
///
/// Deterministic given the same inputs.
pub fn derive_strategies(
    query: &str,
    category: ProblemCategory,
    technologies: &BTreeSet<String>,
    versions: &BTreeSet<String>,
) -> BTreeMap<Source, SearchStrategy> {
    let keywords = strip_filler(query);

    let mut strategies = BTreeMap::new();
    strategies.insert(
        Source::StackOverflow,
        stackoverflow_strategy(query, &keywords, category, technologies, versions),
    );
    strategies.insert(
        Source::GitHub,
        github_strategy(query, &keywords, category, technologies, versions),
    );
    strategies.insert(
        Source::Reddit,
        reddit_strategy(query, &keywords, category, technologies, versions),
    );
    strategies
}

fn stackoverflow_strategy(
    query: &str,
    keywords: &[&str],
    category: ProblemCategory,
    technologies: &BTreeSet<String>,
    versions: &BTreeSet<String>,
) -> SearchStrategy {
    let mut tags: Vec<String> = Vec::new();
    let mut tagged: Vec<&str> = Vec::new();
    for tech in technologies {
        if let Some(tag) = lookup(STACKOVERFLOW_TAGS, tech) {
            tagged.push(tech);
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_owned());
            }
        }
    }

    let (sort, require_accepted) = match category {
        ProblemCategory::Configuration | ProblemCategory::BestPractice => ("votes", true),
        ProblemCategory::Bug | ProblemCategory::Compatibility => ("activity", false),
        ProblemCategory::Performance | ProblemCategory::Unknown => ("relevance", false),
    };

    let scoped = without_technologies(keywords, &tagged);
    SearchStrategy {
        query: query_override(query, &with_versions(&scoped, versions)),
        tags,
        sort: Some(sort.into()),
        require_accepted,
        min_score: (category == ProblemCategory::BestPractice).then_some(1),
        ..Default::default()
    }
}

fn github_strategy(
    query: &str,
    keywords: &[&str],
    category: ProblemCategory,
    technologies: &BTreeSet<String>,
    versions: &BTreeSet<String>,
) -> SearchStrategy {
    let none: &[&str] = &[];
    let (prioritize, exclude): (&[&str], &[&str]) = match category {
        ProblemCategory::Bug => (&["bug", "issue"][..], &["enhancement"][..]),
        ProblemCategory::Performance => (&["performance"][..], none),
        ProblemCategory::Compatibility => (&["breaking-change", "compatibility"][..], none),
        ProblemCategory::Configuration => (&["question", "documentation"][..], none),
        ProblemCategory::BestPractice | ProblemCategory::Unknown => (none, none),
    };
    let exclude_terms: &[&str] = match category {
        ProblemCategory::Bug | ProblemCategory::Performance | ProblemCategory::Compatibility => {
            &["feature request"]
        }
        ProblemCategory::Configuration | ProblemCategory::BestPractice | ProblemCategory::Unknown => {
            none
        }
    };

    let mut repositories: Vec<String> = Vec::new();
    let mut scoped_techs: Vec<&str> = Vec::new();
    for tech in technologies {
        let repos = lookup(TECH_REPOSITORIES, tech).unwrap_or_default();
        if !repos.is_empty() {
            scoped_techs.push(tech);
        }
        for repo in repos {
            if !repositories.iter().any(|r| r == repo) {
                repositories.push((*repo).to_owned());
            }
        }
    }

    let sort = match category {
        ProblemCategory::Bug | ProblemCategory::Compatibility => "updated",
        _ => "reactions",
    };

    let scoped = without_technologies(keywords, &scoped_techs);
    SearchStrategy {
        query: query_override(query, &with_versions(&scoped, versions)),
        exclude_terms: to_strings(exclude_terms),
        prioritize_labels: to_strings(prioritize),
        exclude_labels: to_strings(exclude),
        repositories,
        sort: Some(sort.into()),
        ..Default::default()
    }
}

fn reddit_strategy(
    query: &str,
    keywords: &[&str],
    category: ProblemCategory,
    technologies: &BTreeSet<String>,
    versions: &BTreeSet<String>,
) -> SearchStrategy {
    let mut subreddits: Vec<String> = Vec::new();
    for tech in technologies {
        for sub in lookup(SUBREDDITS, tech).unwrap_or_default() {
            if !subreddits.iter().any(|s| s == sub) {
                subreddits.push((*sub).to_owned());
            }
        }
    }
    if subreddits.is_empty() {
        subreddits = to_strings(DEFAULT_SUBREDDITS);
    }

    let best_practice = category == ProblemCategory::BestPractice;
    let exclude_terms: &[&str] = if best_practice {
        &["rant", "hiring"]
    } else {
        &["hiring"]
    };
    let unversioned: Vec<&str> = keywords
        .iter()
        .copied()
        .filter(|word| !is_version_token(word, versions))
        .collect();

    SearchStrategy {
        query: query_override(query, &unversioned.join(" ")),
        exclude_terms: to_strings(exclude_terms),
        subreddits,
        exclude_flairs: if best_practice {
            to_strings(LOW_SIGNAL_FLAIRS)
        } else {
            Vec::new()
        },
        sort: Some(if best_practice { "top" } else { "relevance" }.into()),
        min_score: Some(if best_practice { 5 } else { 1 }),
        ..Default::default()
    }
}

/// Splits `query` into words and drops the conversational lead-in
/// ("how do I", "why does my"). Trailing `?` and `!` are removed.
fn strip_filler(query: &str) -> Vec<&str> {
    let words: Vec<&str> = query
        .split_whitespace()
        .map(|w| w.trim_end_matches(['?', '!']))
        .filter(|w| !w.is_empty())
        .collect();
    let lead = words
        .iter()
        .take_while(|w| FILLER_WORDS.contains(&normalise_word(w).as_str()))
        .count();
    words[lead..].to_vec()
}

/// Removes words that are an alias of one of `technologies`.
fn without_technologies(words: &[&str], technologies: &[&str]) -> String {
    let aliases: Vec<&str> = technologies
        .iter()
        .flat_map(|tech| lookup(TECHNOLOGIES, tech).unwrap_or_default().iter().copied())
        .collect();
    words
        .iter()
        .copied()
        .filter(|word| !aliases.contains(&normalise_word(word).as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_version_token(word: &str, versions: &BTreeSet<String>) -> bool {
    let word = normalise_word(word);
    let bare = word.strip_prefix('v').unwrap_or(&word);
    versions.contains(bare)
}

fn normalise_word(word: &str) -> String {
    word.trim_matches(|c: char| matches!(c, ',' | '.' | ':' | ';' | '(' | ')' | '"' | '\''))
        .to_lowercase()
}

/// Appends detected versions missing from `text`.
fn with_versions(text: &str, versions: &BTreeSet<String>) -> String {
    let trimmed = text.trim();
    let missing: Vec<&str> = versions
        .iter()
        .filter(|v| !trimmed.contains(v.as_str()))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        trimmed.to_owned()
    } else if trimmed.is_empty() {
        missing.join(" ")
    } else {
        format!("{trimmed} {}", missing.join(" "))
    }
}

/// `None` when `candidate` is empty or identical to the original query.
fn query_override(original: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    (!candidate.is_empty() && candidate != original.trim()).then(|| candidate.to_owned())
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn one_strategy_per_source() {
        let strategies =
            derive_strategies("anything", ProblemCategory::Unknown, &set(&[]), &set(&[]));
        assert_eq!(strategies.len(), Source::all().len());
        for source in Source::all() {
            assert!(strategies.contains_key(source));
        }
    }

    #[test]
    fn bug_prioritises_bug_labels_and_excludes_enhancements() {
        let strategies =
            derive_strategies("crash on start", ProblemCategory::Bug, &set(&[]), &set(&[]));
        let github = &strategies[&Source::GitHub];
        assert_eq!(github.prioritize_labels, vec!["bug", "issue"]);
        assert_eq!(github.exclude_labels, vec!["enhancement"]);
    }

    #[test]
    fn configuration_and_best_practice_require_accepted_answers() {
        for category in [ProblemCategory::Configuration, ProblemCategory::BestPractice] {
            let strategies = derive_strategies("q", category, &set(&[]), &set(&[]));
            assert!(strategies[&Source::StackOverflow].require_accepted);
        }
        let strategies = derive_strategies("q", ProblemCategory::Bug, &set(&[]), &set(&[]));
        assert!(!strategies[&Source::StackOverflow].require_accepted);
    }

    #[test]
    fn best_practice_excludes_low_signal_flairs() {
        let strategies =
            derive_strategies("q", ProblemCategory::BestPractice, &set(&[]), &set(&[]));
        let reddit = &strategies[&Source::Reddit];
        assert_eq!(reddit.exclude_flairs, vec!["meme", "humor", "showoff"]);
        assert_eq!(reddit.sort.as_deref(), Some("top"));
        assert_eq!(reddit.min_score, Some(5));
    }

    #[test]
    fn technologies_scope_repositories_tags_and_subreddits() {
        let strategies = derive_strategies(
            "react tokio",
            ProblemCategory::Unknown,
            &set(&["react", "tokio"]),
            &set(&[]),
        );
        assert_eq!(
            strategies[&Source::GitHub].repositories,
            vec!["facebook/react", "tokio-rs/tokio"]
        );
        assert_eq!(
            strategies[&Source::StackOverflow].tags,
            vec!["reactjs", "rust-tokio"]
        );
        assert_eq!(strategies[&Source::Reddit].subreddits, vec!["reactjs", "rust"]);
    }

    #[test]
    fn unmapped_technology_falls_back_to_default_subreddit() {
        let strategies =
            derive_strategies("q", ProblemCategory::Unknown, &set(&["graphql"]), &set(&[]));
        assert_eq!(strategies[&Source::Reddit].subreddits, vec!["programming"]);
        assert!(strategies[&Source::GitHub].repositories.contains(&"graphql/graphql-js".to_owned()));
    }

    #[test]
    fn missing_versions_appended_to_query() {
        assert_eq!(with_versions("hooks v18", &set(&["18", "18.2"])), "hooks v18 18.2");
        assert_eq!(with_versions("node 20 crash", &set(&["20"])), "node 20 crash");
        assert_eq!(with_versions("", &set(&["3"])), "3");
    }

    #[test]
    fn lead_in_words_are_stripped() {
        assert_eq!(
            strip_filler("How do I configure webpack proxy?"),
            vec!["configure", "webpack", "proxy"]
        );
        assert_eq!(strip_filler("why"), Vec::<&str>::new());
        assert_eq!(strip_filler("tokio runtime panic"), vec!["tokio", "runtime", "panic"]);
    }

    #[test]
    fn override_is_none_when_nothing_changes() {
        let strategies = derive_strategies(
            "hydration mismatch warning",
            ProblemCategory::Unknown,
            &set(&[]),
            &set(&[]),
        );
        for strategy in strategies.values() {
            assert_eq!(strategy.query, None);
        }
    }

    #[test]
    fn technology_only_query_keeps_original() {
        let strategies =
            derive_strategies("react", ProblemCategory::Unknown, &set(&["react"]), &set(&[]));
        assert_eq!(strategies[&Source::StackOverflow].query, None);
        assert_eq!(strategies[&Source::GitHub].query, None);
    }

    #[test]
    fn exclude_terms_follow_category() {
        let bug = derive_strategies("q", ProblemCategory::Bug, &set(&[]), &set(&[]));
        assert_eq!(bug[&Source::GitHub].exclude_terms, vec!["feature request"]);
        assert_eq!(bug[&Source::Reddit].exclude_terms, vec!["hiring"]);
        assert!(bug[&Source::StackOverflow].exclude_terms.is_empty());

        let advice = derive_strategies("q", ProblemCategory::BestPractice, &set(&[]), &set(&[]));
        assert!(advice[&Source::GitHub].exclude_terms.is_empty());
        assert_eq!(advice[&Source::Reddit].exclude_terms, vec!["rant", "hiring"]);
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = derive_strategies("q", ProblemCategory::Performance, &set(&["vue"]), &set(&["3"]));
        let b = derive_strategies("q", ProblemCategory::Performance, &set(&["vue"]), &set(&["3"]));
        assert_eq!(a, b);
    }
}
