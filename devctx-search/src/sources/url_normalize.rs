//! Canonical URLs for source results.
//!
//! Results reached through different hosts or link forms (old.reddit.com,
//! Stack Overflow short links, tracking parameters, fragments) collapse
//! to one canonical string before they leave an adapter.

use url::Url;

/// Query parameters that never change the page being linked.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "ref",
    "share_id",
    "context",
];

/// Reddit hosts that serve the same thread as `www.reddit.com`.
const REDDIT_ALIASES: &[&str] = &["reddit.com", "old.reddit.com", "new.reddit.com", "np.reddit.com"];

/// Canonicalise a result URL.
///
/// 1. Lowercase scheme and host; drop default ports and the fragment.
/// 2. Map Reddit host aliases to `www.reddit.com`.
/// 3. Expand Stack Overflow `/q/{id}` short links to `/questions/{id}`.
///    Answer links (`/a/{id}`) carry an answer id, not a question id, and
///    are left as they are.
/// 4. Strip tracking parameters and sort the rest by key.
/// 5. Remove a trailing slash unless the path is `/`.
///
/// Input that does not parse as a URL is returned unchanged.
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw.trim()) else {
        return raw.to_owned();
    };

    parsed.set_fragment(None);
    if matches!(
        (parsed.scheme(), parsed.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        if parsed.set_port(None).is_err() {
            tracing::debug!(url = raw, "could not drop default port");
        }
    }

    if parsed
        .host_str()
        .is_some_and(|host| REDDIT_ALIASES.contains(&host))
    {
        if let Err(e) = parsed.set_host(Some("www.reddit.com")) {
            tracing::debug!(url = raw, error = %e, "could not rewrite reddit host");
        }
    }

    if parsed.host_str() == Some("stackoverflow.com") {
        if let Some(expanded) = expand_stackoverflow_short_link(parsed.path()) {
            parsed.set_path(&expanded);
        }
    }

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();
    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(params);
    }

    let path = parsed.path().to_owned();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

/// `/q/123/456` → `/questions/123`.
fn expand_stackoverflow_short_link(path: &str) -> Option<String> {
    let mut segments = path.trim_start_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some("q"), Some(id)) if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) => {
            Some(format!("/questions/{id}"))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_host_and_drops_fragment() {
        assert_eq!(
            normalize_url("HTTPS://GitHub.COM/rust-lang/rust/issues/1#issuecomment-2"),
            "https://github.com/rust-lang/rust/issues/1"
        );
    }

    #[test]
    fn removes_default_port_and_trailing_slash() {
        assert_eq!(
            normalize_url("https://github.com:443/tokio-rs/tokio/issues/9/"),
            "https://github.com/tokio-rs/tokio/issues/9"
        );
    }

    #[test]
    fn reddit_aliases_collapse() {
        let canonical = "https://www.reddit.com/r/rust/comments/abc/title";
        assert_eq!(normalize_url("https://old.reddit.com/r/rust/comments/abc/title/"), canonical);
        assert_eq!(normalize_url("https://reddit.com/r/rust/comments/abc/title"), canonical);
        assert_eq!(normalize_url(canonical), canonical);
    }

    #[test]
    fn stackoverflow_short_links_expand() {
        assert_eq!(
            normalize_url("https://stackoverflow.com/q/123456/789"),
            "https://stackoverflow.com/questions/123456"
        );
        assert_eq!(
            normalize_url("https://stackoverflow.com/q/42"),
            "https://stackoverflow.com/questions/42"
        );
        assert_eq!(
            normalize_url("https://stackoverflow.com/questions/1/how-to"),
            "https://stackoverflow.com/questions/1/how-to"
        );
    }

    #[test]
    fn stackoverflow_answer_links_stay_unchanged() {
        assert_eq!(
            normalize_url("https://stackoverflow.com/a/42"),
            "https://stackoverflow.com/a/42"
        );
        assert_eq!(
            normalize_url("https://stackoverflow.com/a/42/1001"),
            "https://stackoverflow.com/a/42/1001"
        );
    }

    #[test]
    fn strips_tracking_and_sorts_params() {
        assert_eq!(
            normalize_url("https://example.com/p?z=1&utm_source=x&a=2&context=3"),
            "https://example.com/p?a=2&z=1"
        );
    }

    #[test]
    fn invalid_url_returned_unchanged() {
        assert_eq!(normalize_url("not a url"), "not a url");
        assert_eq!(normalize_url(""), "");
    }
}
