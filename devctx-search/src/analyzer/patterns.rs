//! Static lookup tables for query analysis and strategy derivation.
//!
//! Pattern strings are compiled once by [`super::QueryAnalyzer::new`].
//! Table order is significant wherever results are collected into ordered
//! output (repositories, subreddits).

use crate::types::ProblemCategory;

/// Signal patterns per category. Every occurrence of every pattern adds
/// one point to its category.
pub(crate) const CATEGORY_SIGNALS: &[(ProblemCategory, &[&str])] = &[
    (
        ProblemCategory::Configuration,
        &[
            r"(?i)\b(config|configure|configuring|configuration|settings?)\b",
            r"(?i)\b(setup|set up|install|installing|installation)\b",
            r"(?i)\b(env|environment)\s+(var|vars|variable|variables)\b",
            r"(?i)\.(json|ya?ml|toml|ini|env|rc)\b",
            r"(?i)\bhow (do i|to|can i) (enable|disable|set|change|add)\b",
        ],
    ),
    (
        ProblemCategory::Bug,
        &[
            r"(?i)\b(error|errors|exception|crash|crashes|crashing|broken)\b",
            r"(?i)\b(bug|fails|failed|failing|failure)\b",
            r"(?i)\b(not working|doesn'?t work|does not work|won'?t|stopped working)\b",
            r"(?i)\b(undefined|null pointer|nullpointer|nan|segfault|panic|panicked)\b",
            r"(?i)\b[a-z]+error\b",
        ],
    ),
    (
        ProblemCategory::Performance,
        &[
            r"(?i)\b(performance|perf)\b",
            r"(?i)\b(slow|slower|slowly|slowness|laggy|lagging|sluggish|freezes|freezing)\b",
            r"(?i)\b(memory leak|high memory|cpu usage|bottleneck|latency)\b",
            r"(?i)\b(optimi[sz]e|optimi[sz]ing|optimi[sz]ation|speed up|faster)\b",
        ],
    ),
    (
        ProblemCategory::Compatibility,
        &[
            r"(?i)\b(compatible|compatibility|incompatible|incompatibility)\b",
            r"(?i)\b(upgrade|upgrading|migrate|migrating|migration|downgrade)\b",
            r"(?i)\b(deprecated|deprecation|breaking changes?)\b",
            r"(?i)\b(peer dependency|peer dep|version conflict|not supported)\b",
        ],
    ),
    (
        ProblemCategory::BestPractice,
        &[
            r"(?i)\bbest (practice|practices|way|approach)\b",
            r"(?i)\b(should i|recommended|idiomatic|proper way|right way)\b",
            r"(?i)\b(pattern|patterns|architecture|structure|structuring)\b",
            r"(?i)\b(vs|versus|compared to|or better)\b",
        ],
    ),
];

/// Broader performance vocabulary; adds +2 to a non-zero performance score.
pub(crate) const PERFORMANCE_BOOST: &str =
    r"(?i)\b(memory|speed|fast|slow|optimi[sz]\w*|render\w*|performance|throughput)\b";

/// Broader setup vocabulary; adds +1 to a non-zero configuration score.
pub(crate) const CONFIGURATION_BOOST: &str =
    r"(?i)\b(setup|set up|install\w*|environment|env|dotenv|path)\b";

/// Vocabulary collected into `QueryAnalysis::error_keywords`.
pub(crate) const ERROR_KEYWORDS: &str = r"(?i)\b(error|exception|crash(?:es|ed|ing)?|fail(?:s|ed|ing|ure)?|undefined|null|nan|timeout|segfault|panic(?:ked|s)?|traceback|cannot|unable|refused|denied|[a-z]+error|[a-z]+exception)\b";

/// Version patterns. The first capture group, or the whole match when the
/// pattern has none, is the extracted version.
pub(crate) const VERSION_PATTERNS: &[&str] = &[
    r"\b\d+\.\d+(?:\.\d+)?\b",
    r"(?i)\b(?:version|ver|v)\s*(\d+(?:\.\d+)*)\b",
    r"(?i)\b(?:react|vue|angular|node|python|typescript|next\.?js|django|rust|java|go|php|ruby)\s+v?(\d+(?:\.\d+)*)\b",
];

/// Canonical technology name → lowercase surface aliases.
pub(crate) const TECHNOLOGIES: &[(&str, &[&str])] = &[
    ("react", &["react", "reactjs", "react.js"]),
    ("vue", &["vue", "vuejs", "vue.js"]),
    ("angular", &["angular"]),
    ("nextjs", &["next.js", "nextjs"]),
    ("svelte", &["svelte", "sveltekit"]),
    ("node", &["node", "nodejs", "node.js"]),
    ("typescript", &["typescript"]),
    ("javascript", &["javascript"]),
    ("python", &["python"]),
    ("django", &["django"]),
    ("flask", &["flask"]),
    ("fastapi", &["fastapi"]),
    ("rust", &["rust", "cargo"]),
    ("tokio", &["tokio"]),
    ("golang", &["golang"]),
    ("docker", &["docker", "dockerfile"]),
    ("kubernetes", &["kubernetes", "k8s", "kubectl"]),
    ("webpack", &["webpack"]),
    ("vite", &["vite"]),
    ("tailwind", &["tailwind", "tailwindcss"]),
    ("express", &["express.js", "expressjs"]),
    ("graphql", &["graphql"]),
    ("postgresql", &["postgres", "postgresql", "psql"]),
    ("mongodb", &["mongodb", "mongo"]),
    ("redis", &["redis"]),
];

/// Canonical technology → issue-tracker repositories to scope searches to.
pub(crate) const TECH_REPOSITORIES: &[(&str, &[&str])] = &[
    ("react", &["facebook/react"]),
    ("vue", &["vuejs/core"]),
    ("angular", &["angular/angular"]),
    ("nextjs", &["vercel/next.js"]),
    ("svelte", &["sveltejs/svelte", "sveltejs/kit"]),
    ("node", &["nodejs/node"]),
    ("typescript", &["microsoft/TypeScript"]),
    ("django", &["django/django"]),
    ("flask", &["pallets/flask"]),
    ("fastapi", &["fastapi/fastapi"]),
    ("rust", &["rust-lang/rust", "rust-lang/cargo"]),
    ("tokio", &["tokio-rs/tokio"]),
    ("golang", &["golang/go"]),
    ("docker", &["docker/cli", "moby/moby"]),
    ("kubernetes", &["kubernetes/kubernetes"]),
    ("webpack", &["webpack/webpack"]),
    ("vite", &["vitejs/vite"]),
    ("tailwind", &["tailwindlabs/tailwindcss"]),
    ("express", &["expressjs/express"]),
    ("graphql", &["graphql/graphql-js"]),
    ("redis", &["redis/redis"]),
];

/// Canonical technology → Stack Overflow tag.
pub(crate) const STACKOVERFLOW_TAGS: &[(&str, &str)] = &[
    ("react", "reactjs"),
    ("vue", "vue.js"),
    ("angular", "angular"),
    ("nextjs", "next.js"),
    ("svelte", "svelte"),
    ("node", "node.js"),
    ("typescript", "typescript"),
    ("javascript", "javascript"),
    ("python", "python"),
    ("django", "django"),
    ("flask", "flask"),
    ("fastapi", "fastapi"),
    ("rust", "rust"),
    ("tokio", "rust-tokio"),
    ("golang", "go"),
    ("docker", "docker"),
    ("kubernetes", "kubernetes"),
    ("webpack", "webpack"),
    ("vite", "vite"),
    ("tailwind", "tailwind-css"),
    ("express", "express"),
    ("graphql", "graphql"),
    ("postgresql", "postgresql"),
    ("mongodb", "mongodb"),
    ("redis", "redis"),
];

/// Canonical technology → subreddits.
pub(crate) const SUBREDDITS: &[(&str, &[&str])] = &[
    ("react", &["reactjs"]),
    ("vue", &["vuejs"]),
    ("angular", &["Angular2"]),
    ("nextjs", &["nextjs"]),
    ("svelte", &["sveltejs"]),
    ("node", &["node"]),
    ("typescript", &["typescript"]),
    ("javascript", &["javascript"]),
    ("python", &["learnpython", "Python"]),
    ("django", &["django"]),
    ("flask", &["flask"]),
    ("rust", &["rust"]),
    ("tokio", &["rust"]),
    ("golang", &["golang"]),
    ("docker", &["docker"]),
    ("kubernetes", &["kubernetes"]),
    ("postgresql", &["PostgreSQL"]),
    ("webpack", &["webdev"]),
    ("vite", &["webdev"]),
    ("tailwind", &["tailwindcss"]),
];

/// Subreddits used when no detected technology maps to one.
pub(crate) const DEFAULT_SUBREDDITS: &[&str] = &["programming"];

/// Forum flairs that carry little technical signal.
pub(crate) const LOW_SIGNAL_FLAIRS: &[&str] = &["meme", "humor", "showoff"];

/// Conversational lead-in words dropped from the front of source queries.
pub(crate) const FILLER_WORDS: &[&str] = &[
    "a", "an", "any", "anyone", "are", "can", "could", "do", "does", "help", "how", "i",
    "is", "it", "me", "my", "please", "the", "there", "to", "what", "when", "where", "which",
    "why", "would", "you",
];

/// Looks up `key` in a two-column table.
pub(crate) fn lookup<'a, V: ?Sized>(table: &'a [(&str, &'a V)], key: &str) -> Option<&'a V> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}
