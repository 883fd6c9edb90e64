//! Body extraction shared by the source adapters: code blocks, plain text
//! and version markers.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::types::CodeSnippet;

/// Fenced Markdown code blocks, with their optional language tag.
pub fn fenced_code_blocks(markdown: &str) -> Vec<CodeSnippet> {
    let Some(re) = fenced_block() else {
        return Vec::new();
    };
    re.captures_iter(markdown)
        .filter_map(|caps| {
            let code = caps.get(2)?.as_str().trim_matches('\n');
            if code.trim().is_empty() {
                return None;
            }
            Some(CodeSnippet {
                language: caps.get(1).map_or("", |m| m.as_str()).to_lowercase(),
                code: code.to_owned(),
            })
        })
        .collect()
}

/// `<pre><code>` blocks from an HTML body.
///
/// The language comes from a `lang-*` or `language-*` class on either the
/// `<pre>` or the `<code>` element.
pub fn html_code_blocks(html: &str) -> Vec<CodeSnippet> {
    let Ok(pre_sel) = Selector::parse("pre") else {
        return Vec::new();
    };
    let Ok(code_sel) = Selector::parse("code") else {
        return Vec::new();
    };

    let fragment = Html::parse_fragment(html);
    fragment
        .select(&pre_sel)
        .filter_map(|pre| {
            let code_el = pre.select(&code_sel).next();
            let text: String = match code_el {
                Some(el) => el.text().collect(),
                None => pre.text().collect(),
            };
            let text = text.trim_matches('\n');
            if text.trim().is_empty() {
                return None;
            }

            let language = code_el
                .and_then(|el| language_class(el.value().attr("class")))
                .or_else(|| language_class(pre.value().attr("class")))
                .unwrap_or_default();

            Some(CodeSnippet {
                language,
                code: text.to_owned(),
            })
        })
        .collect()
}

/// Readable text of an HTML body. `<pre>` blocks are kept fenced so the
/// aggregator can recognise them as code.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let Ok(block_sel) = Selector::parse("p, pre, li, blockquote, h1, h2, h3, h4, h5, h6") else {
        return normalise_whitespace(&fragment.root_element().text().collect::<String>());
    };

    let mut paragraphs: Vec<String> = Vec::new();
    for el in fragment.select(&block_sel) {
        // Nested blocks (a <p> inside an <li>) are reached through their parent.
        let nested = el
            .ancestors()
            .filter_map(scraper::ElementRef::wrap)
            .any(|a| block_sel.matches(&a));
        if nested {
            continue;
        }

        let text: String = el.text().collect();
        if el.value().name() == "pre" {
            paragraphs.push(format!("```\n{}\n```", text.trim_matches('\n')));
        } else {
            let text = normalise_whitespace(&text);
            if !text.is_empty() {
                paragraphs.push(text);
            }
        }
    }

    if paragraphs.is_empty() {
        normalise_whitespace(&fragment.root_element().text().collect::<String>())
    } else {
        paragraphs.join("\n\n")
    }
}

/// Decode HTML character references the JSON APIs leave in titles and
/// names. The input is plain text, so a raw `<` is escaped before parsing
/// and never read as markup.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    Html::parse_fragment(&text.replace('<', "&lt;"))
        .root_element()
        .text()
        .collect()
}

/// Version marker from tags (`python-3.x`, `angular-17`) or the title
/// (`v18.2`, `version 5`).
pub fn detect_version(title: &str, tags: &[String]) -> Option<String> {
    if let Some(re) = tag_version() {
        for tag in tags {
            if let Some(m) = re.captures(tag).and_then(|c| c.get(1)) {
                return Some(m.as_str().to_owned());
            }
        }
    }
    title_version()
        .and_then(|re| re.captures(title))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

fn language_class(class: Option<&str>) -> Option<String> {
    class?
        .split_whitespace()
        .find_map(|c| c.strip_prefix("lang-").or_else(|| c.strip_prefix("language-")))
        .filter(|lang| !lang.is_empty() && *lang != "none")
        .map(str::to_lowercase)
}

fn normalise_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fenced_block() -> Option<&'static Regex> {
    static FENCED: OnceLock<Option<Regex>> = OnceLock::new();
    FENCED
        .get_or_init(|| Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+#.-]*)[^\n]*\n(.*?)```").ok())
        .as_ref()
}

fn tag_version() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"^[a-z][a-z0-9.+#]*-(\d+(?:\.(?:\d+|x))*)$").ok())
        .as_ref()
}

fn title_version() -> Option<&'static Regex> {
    static TITLE: OnceLock<Option<Regex>> = OnceLock::new();
    TITLE
        .get_or_init(|| Regex::new(r"(?i)\b(?:v|version\s*)(\d+(?:\.\d+){0,2})\b").ok())
        .as_ref()
}
