//! Tools exposed over the host channel.
//!
//! A [`Tool`] carries its own name, description and JSON Schema, and
//! turns JSON arguments into a [`ToolOutcome`]. Tools never fail the call
//! itself: validation and pipeline errors come back as an outcome with
//! `ok: false`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use devctx_search::{GatherRequest, Gatherer, MAX_RESULTS_LIMIT, Source};
use serde::Serialize;

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutcome {
    /// Whether the tool execution succeeded.
    pub ok: bool,
    /// Structured output; `null` on failure.
    pub payload: serde_json::Value,
    /// Error message if the tool execution failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutcome {
    /// Create a successful outcome.
    pub fn success(payload: serde_json::Value) -> Self {
        Self {
            ok: true,
            payload,
            error: None,
        }
    }

    /// Create a failed outcome with an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(error.into()),
        }
    }
}

/// A named operation callable over the host channel.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name.
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's arguments.
    fn schema(&self) -> serde_json::Value;

    /// Execute the tool with the given JSON arguments.
    async fn execute(&self, args: serde_json::Value) -> ToolOutcome;
}

/// Registry of available tools keyed by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Names of all registered tools, sorted.
    pub fn list_available(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.values().map(|t| t.name()).collect();
        names.sort_unstable();
        names
    }

    /// Export `{name, description, parameters}` entries, sorted by name.
    pub fn schemas_for_api(&self) -> Vec<serde_json::Value> {
        let mut schemas: Vec<(String, serde_json::Value)> = self
            .tools
            .values()
            .map(|t| {
                let entry = serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "parameters": t.schema(),
                });
                (t.name().to_string(), entry)
            })
            .collect();
        schemas.sort_by(|a, b| a.0.cmp(&b.0));
        schemas.into_iter().map(|(_, v)| v).collect()
    }
}

/// Gathers ranked developer context through a shared [`Gatherer`].
pub struct GatherContextTool {
    gatherer: Arc<Gatherer>,
}

impl GatherContextTool {
    pub const NAME: &'static str = "gather_developer_context";

    pub fn new(gatherer: Arc<Gatherer>) -> Self {
        Self { gatherer }
    }
}

#[async_trait]
impl Tool for GatherContextTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Search Stack Overflow, GitHub issues and Reddit for a developer question \
         and return a ranked summary with highlights, citations and code snippets."
    }

    fn schema(&self) -> serde_json::Value {
        let sources: Vec<&str> = Source::all().iter().map(|s| s.id()).collect();
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The problem or question, e.g. an error message or 'how to ...'"
                },
                "sources": {
                    "type": "array",
                    "items": { "type": "string", "enum": sources },
                    "description": "Sources to search (default: all configured sources)"
                },
                "maxResults": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": MAX_RESULTS_LIMIT,
                    "description": "Upper bound on results fetched per source"
                },
                "depth": {
                    "type": "string",
                    "enum": ["quick", "thorough"],
                    "description": "thorough fetches more results per source"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> ToolOutcome {
        let request: GatherRequest = match serde_json::from_value(args) {
            Ok(request) => request,
            Err(e) => return ToolOutcome::failure(format!("invalid arguments: {e}")),
        };

        let bundle = match self.gatherer.gather(&request).await {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::warn!(error = %e, "gather_developer_context failed");
                return ToolOutcome::failure(e.to_string());
            }
        };

        match serde_json::to_value(&bundle) {
            Ok(payload) => ToolOutcome::success(payload),
            Err(e) => ToolOutcome::failure(format!("failed to encode result: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devctx_search::{GatherConfig, Result as SearchResult, SearchStrategy, SourceAdapter};
    use devctx_search::{NormalizedResult, ProblemCategory};
    use serde_json::json;

    struct EmptyAdapter(Source);

    #[async_trait]
    impl SourceAdapter for EmptyAdapter {
        async fn search(
            &self,
            _query: &str,
            _max_results: usize,
            _strategy: &SearchStrategy,
            _category: ProblemCategory,
        ) -> SearchResult<Vec<NormalizedResult>> {
            Ok(Vec::new())
        }

        fn source(&self) -> Source {
            self.0
        }
    }

    fn tool() -> GatherContextTool {
        let adapters: Vec<Arc<dyn SourceAdapter>> = Source::all()
            .iter()
            .map(|s| Arc::new(EmptyAdapter(*s)) as Arc<dyn SourceAdapter>)
            .collect();
        let gatherer = Gatherer::new(GatherConfig::default(), adapters).expect("gatherer");
        GatherContextTool::new(Arc::new(gatherer))
    }

    #[test]
    fn schema_requires_query_only() {
        let schema = tool().schema();
        assert_eq!(schema["required"], json!(["query"]));
        assert_eq!(
            schema["properties"]["sources"]["items"]["enum"],
            json!(["stackoverflow", "github", "reddit"])
        );
        assert_eq!(schema["properties"]["maxResults"]["maximum"], json!(50));
    }

    #[tokio::test]
    async fn missing_query_is_failure_outcome() {
        let outcome = tool().execute(json!({"depth": "quick"})).await;
        assert!(!outcome.ok);
        assert!(outcome.error.unwrap_or_default().contains("invalid arguments"));
    }

    #[tokio::test]
    async fn unknown_source_is_failure_outcome() {
        let outcome = tool()
            .execute(json!({"query": "x", "sources": ["hackernews"]}))
            .await;
        assert!(!outcome.ok);
    }

    #[tokio::test]
    async fn out_of_range_max_results_is_failure_outcome() {
        let outcome = tool().execute(json!({"query": "x", "maxResults": 500})).await;
        assert!(!outcome.ok);
        assert!(outcome.error.unwrap_or_default().contains("maxResults"));
    }

    #[tokio::test]
    async fn empty_sources_yield_empty_bundle() {
        let outcome = tool()
            .execute(json!({"query": "rust lifetime error", "maxResults": 3}))
            .await;
        assert!(outcome.ok, "{:?}", outcome.error);
        assert_eq!(outcome.payload["summary"], "No results found.");
        assert_eq!(outcome.payload["citations"], json!([]));
    }

    #[test]
    fn registry_lists_and_exports_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(tool()));
        assert_eq!(registry.list_available(), vec![GatherContextTool::NAME]);
        assert!(registry.get(GatherContextTool::NAME).is_some());
        assert!(registry.get("missing").is_none());

        let schemas = registry.schemas_for_api();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0]["name"], GatherContextTool::NAME);
        assert!(schemas[0]["parameters"].is_object());
    }

    #[test]
    fn outcome_serialization_omits_absent_error() {
        let json = serde_json::to_value(ToolOutcome::success(json!({"a": 1}))).expect("ser");
        assert!(json.get("error").is_none());
        let json = serde_json::to_value(ToolOutcome::failure("nope")).expect("ser");
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "nope");
    }
}
