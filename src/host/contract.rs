//! Versioned command/response envelopes for the host channel.

use serde::{Deserialize, Serialize};

/// Contract version for host command/response envelopes.
pub const EVENT_VERSION: u32 = 1;

/// Command set understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "host.ping")]
    HostPing,
    #[serde(rename = "host.version")]
    HostVersion,
    #[serde(rename = "tool.list")]
    ToolList,
    #[serde(rename = "tool.call")]
    ToolCall,
    #[serde(rename = "runtime.stop")]
    RuntimeStop,
}

impl CommandName {
    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostPing => "host.ping",
            Self::HostVersion => "host.version",
            Self::ToolList => "tool.list",
            Self::ToolCall => "tool.call",
            Self::RuntimeStop => "runtime.stop",
        }
    }

    /// Parse a command name from wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "host.ping" => Some(Self::HostPing),
            "host.version" => Some(Self::HostVersion),
            "tool.list" => Some(Self::ToolList),
            "tool.call" => Some(Self::ToolCall),
            "runtime.stop" => Some(Self::RuntimeStop),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommandName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A versioned response envelope from host -> client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    /// Build an error response envelope.
    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}

/// A versioned command envelope from client -> host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    /// Build a v1 command envelope.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            command,
            payload,
        }
    }

    /// Validate envelope version and required identifiers.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.v != EVENT_VERSION {
            return Err(ContractError::new(
                ContractErrorKind::UnsupportedVersion,
                format!(
                    "unsupported contract version {}; expected {}",
                    self.v, EVENT_VERSION
                ),
            ));
        }
        if self.request_id.trim().is_empty() {
            return Err(ContractError::new(
                ContractErrorKind::InvalidEnvelope,
                "request_id cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Contract validation error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractErrorKind {
    UnsupportedVersion,
    InvalidEnvelope,
    InvalidPayload,
}

/// Contract validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractError {
    pub kind: ContractErrorKind,
    pub message: String,
}

impl ContractError {
    #[must_use]
    pub fn new(kind: ContractErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ContractError {}

/// Payload of a `tool.call` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallPayload {
    pub name: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCallPayload {
    /// Extract the call from a command payload.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, ContractError> {
        let call: Self = serde_json::from_value(payload.clone()).map_err(|e| {
            ContractError::new(
                ContractErrorKind::InvalidPayload,
                format!("tool.call payload must carry a tool name: {e}"),
            )
        })?;
        if call.name.trim().is_empty() {
            return Err(ContractError::new(
                ContractErrorKind::InvalidPayload,
                "tool name cannot be empty".to_owned(),
            ));
        }
        Ok(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_names_roundtrip_wire_format() {
        for command in [
            CommandName::HostPing,
            CommandName::HostVersion,
            CommandName::ToolList,
            CommandName::ToolCall,
            CommandName::RuntimeStop,
        ] {
            assert_eq!(CommandName::parse(command.as_str()), Some(command));
            let json = serde_json::to_string(&command).expect("serialize");
            assert_eq!(json, format!("\"{}\"", command.as_str()));
        }
        assert_eq!(CommandName::parse("runtime.start"), None);
    }

    #[test]
    fn command_envelope_parses_without_payload() {
        let env: CommandEnvelope =
            serde_json::from_str(r#"{"v":1,"request_id":"r1","command":"host.ping"}"#)
                .expect("parse");
        assert_eq!(env.command, CommandName::HostPing);
        assert!(env.payload.is_null());
        assert!(env.validate().is_ok());
    }

    #[test]
    fn validate_rejects_wrong_version() {
        let mut env = CommandEnvelope::new("r1", CommandName::HostPing, json!({}));
        env.v = 2;
        let err = env.validate().expect_err("version mismatch");
        assert_eq!(err.kind, ContractErrorKind::UnsupportedVersion);
    }

    #[test]
    fn validate_rejects_blank_request_id() {
        let env = CommandEnvelope::new("  ", CommandName::HostPing, json!({}));
        let err = env.validate().expect_err("blank id");
        assert_eq!(err.kind, ContractErrorKind::InvalidEnvelope);
    }

    #[test]
    fn response_constructors_set_flags() {
        let ok = ResponseEnvelope::ok("r1", json!({"pong": true}));
        assert!(ok.ok);
        assert!(ok.error.is_none());
        assert_eq!(ok.v, EVENT_VERSION);

        let err = ResponseEnvelope::error("r2", "boom");
        assert!(!err.ok);
        assert_eq!(err.payload, serde_json::Value::Null);
        assert_eq!(err.error.as_deref(), Some("boom"));
    }

    #[test]
    fn tool_call_payload_requires_name() {
        let call = ToolCallPayload::from_payload(
            &json!({"name": "gather_developer_context", "arguments": {"query": "x"}}),
        )
        .expect("valid");
        assert_eq!(call.name, "gather_developer_context");
        assert_eq!(call.arguments["query"], "x");

        let err = ToolCallPayload::from_payload(&json!({"arguments": {}})).expect_err("no name");
        assert_eq!(err.kind, ContractErrorKind::InvalidPayload);

        let err = ToolCallPayload::from_payload(&json!({"name": " "})).expect_err("blank name");
        assert_eq!(err.kind, ContractErrorKind::InvalidPayload);
    }
}
