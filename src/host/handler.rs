//! Routes command envelopes to host operations and registered tools.

use crate::host::contract::{
    CommandEnvelope, CommandName, EVENT_VERSION, ResponseEnvelope, ToolCallPayload,
};
use crate::host::tool::ToolRegistry;

/// Dispatches validated commands. Every command yields exactly one response.
pub struct HostHandler {
    registry: ToolRegistry,
}

impl HostHandler {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one command and build its response.
    pub async fn handle(&self, envelope: CommandEnvelope) -> ResponseEnvelope {
        if let Err(e) = envelope.validate() {
            tracing::warn!(request_id = %envelope.request_id, error = %e, "rejected command envelope");
            return ResponseEnvelope::error(envelope.request_id, e.to_string());
        }

        tracing::debug!(
            request_id = %envelope.request_id,
            command = %envelope.command,
            "handling command"
        );

        let request_id = envelope.request_id;
        match envelope.command {
            CommandName::HostPing => ResponseEnvelope::ok(request_id, serde_json::json!({"pong": true})),
            CommandName::HostVersion => ResponseEnvelope::ok(
                request_id,
                serde_json::json!({
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                    "contract": EVENT_VERSION,
                }),
            ),
            CommandName::ToolList => ResponseEnvelope::ok(
                request_id,
                serde_json::json!({"tools": self.registry.schemas_for_api()}),
            ),
            CommandName::ToolCall => self.call_tool(request_id, &envelope.payload).await,
            CommandName::RuntimeStop => {
                ResponseEnvelope::ok(request_id, serde_json::json!({"stopping": true}))
            }
        }
    }

    async fn call_tool(&self, request_id: String, payload: &serde_json::Value) -> ResponseEnvelope {
        let call = match ToolCallPayload::from_payload(payload) {
            Ok(call) => call,
            Err(e) => return ResponseEnvelope::error(request_id, e.to_string()),
        };
        let Some(tool) = self.registry.get(&call.name) else {
            return ResponseEnvelope::error(request_id, format!("unknown tool: {}", call.name));
        };

        let started = std::time::Instant::now();
        let outcome = tool.execute(call.arguments).await;
        tracing::info!(
            tool = %call.name,
            ok = outcome.ok,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tool call finished"
        );

        match serde_json::to_value(&outcome) {
            Ok(value) => ResponseEnvelope::ok(request_id, value),
            Err(e) => ResponseEnvelope::error(request_id, format!("failed to encode tool outcome: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tool::{Tool, ToolOutcome};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo arguments"
        }
        fn schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: serde_json::Value) -> ToolOutcome {
            if args.get("fail").is_some() {
                ToolOutcome::failure("asked to fail")
            } else {
                ToolOutcome::success(args)
            }
        }
    }

    fn handler() -> HostHandler {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        HostHandler::new(registry)
    }

    #[tokio::test]
    async fn ping_returns_pong() {
        let resp = handler()
            .handle(CommandEnvelope::new("r1", CommandName::HostPing, json!({})))
            .await;
        assert!(resp.ok);
        assert_eq!(resp.request_id, "r1");
        assert_eq!(resp.payload["pong"], true);
    }

    #[tokio::test]
    async fn version_reports_contract() {
        let resp = handler()
            .handle(CommandEnvelope::new("r1", CommandName::HostVersion, json!({})))
            .await;
        assert!(resp.ok);
        assert_eq!(resp.payload["name"], "devctx");
        assert_eq!(resp.payload["contract"], EVENT_VERSION);
    }

    #[tokio::test]
    async fn tool_list_exports_schemas() {
        let resp = handler()
            .handle(CommandEnvelope::new("r1", CommandName::ToolList, json!({})))
            .await;
        assert!(resp.ok);
        assert_eq!(resp.payload["tools"][0]["name"], "echo");
    }

    #[tokio::test]
    async fn tool_call_wraps_outcome() {
        let h = handler();
        let resp = h
            .handle(CommandEnvelope::new(
                "r1",
                CommandName::ToolCall,
                json!({"name": "echo", "arguments": {"x": 1}}),
            ))
            .await;
        assert!(resp.ok);
        assert_eq!(resp.payload["ok"], true);
        assert_eq!(resp.payload["payload"]["x"], 1);

        let resp = h
            .handle(CommandEnvelope::new(
                "r2",
                CommandName::ToolCall,
                json!({"name": "echo", "arguments": {"fail": true}}),
            ))
            .await;
        assert!(resp.ok);
        assert_eq!(resp.payload["ok"], false);
        assert_eq!(resp.payload["error"], "asked to fail");
    }

    #[tokio::test]
    async fn unknown_tool_is_error_response() {
        let resp = handler()
            .handle(CommandEnvelope::new(
                "r1",
                CommandName::ToolCall,
                json!({"name": "nope"}),
            ))
            .await;
        assert!(!resp.ok);
        assert!(resp.error.unwrap_or_default().contains("unknown tool"));
    }

    #[tokio::test]
    async fn malformed_tool_call_is_error_response() {
        let resp = handler()
            .handle(CommandEnvelope::new("r1", CommandName::ToolCall, json!(null)))
            .await;
        assert!(!resp.ok);
    }

    #[tokio::test]
    async fn invalid_envelope_is_rejected() {
        let mut env = CommandEnvelope::new("r1", CommandName::HostPing, json!({}));
        env.v = 9;
        let resp = handler().handle(env).await;
        assert!(!resp.ok);
        assert_eq!(resp.request_id, "r1");
    }
}
