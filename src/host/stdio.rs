//! Stdin/stdout JSON bridge for the host command channel.
//!
//! Reads newline-delimited JSON `CommandEnvelope` messages, dispatches them
//! through the [`HostHandler`], and writes one `ResponseEnvelope` per line.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::error::{HostError, Result};
use crate::host::contract::{CommandEnvelope, CommandName, ResponseEnvelope};
use crate::host::handler::HostHandler;

/// Run the bridge over the process stdin/stdout until stdin closes or a
/// `runtime.stop` command is received.
pub async fn run_stdio_bridge(handler: &HostHandler) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = BufWriter::new(tokio::io::stdout());
    run_bridge(handler, reader, writer).await
}

/// Run the bridge over any line reader and writer.
///
/// Commands are handled one at a time in arrival order. Blank lines are
/// ignored; lines that do not parse as a command get a `parse-error`
/// response and the loop continues.
pub async fn run_bridge<R, W>(handler: &HostHandler, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf: Vec<u8> = Vec::new();

    loop {
        buf.clear();
        let bytes_read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| HostError::Channel(format!("failed to read from stdin: {e}")))?;

        // EOF
        if bytes_read == 0 {
            tracing::info!("stdin closed (EOF); shutting down stdio bridge");
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "command line is not valid UTF-8");
                let error_response = ResponseEnvelope::error(
                    "parse-error",
                    format!("command line is not valid UTF-8: {e}"),
                );
                write_response(&mut writer, &error_response).await?;
                continue;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope: CommandEnvelope = match serde_json::from_str(trimmed) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse command envelope from stdin");
                let error_response = ResponseEnvelope::error(
                    "parse-error",
                    format!("failed to parse command envelope: {e}"),
                );
                write_response(&mut writer, &error_response).await?;
                continue;
            }
        };

        let is_stop = envelope.command == CommandName::RuntimeStop;
        let response = handler.handle(envelope).await;
        write_response(&mut writer, &response).await?;

        if is_stop && response.ok {
            tracing::info!("runtime.stop received; shutting down stdio bridge");
            break;
        }
    }

    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &ResponseEnvelope,
) -> Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| HostError::Protocol(format!("failed to serialize response envelope: {e}")))?;
    write_line(writer, &json).await
}

/// Write a single JSON line and flush.
async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<()> {
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| HostError::Channel(format!("failed to write to stdout: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| HostError::Channel(format!("failed to write newline to stdout: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| HostError::Channel(format!("failed to flush stdout: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::tool::ToolRegistry;

    async fn run(input: &str) -> Vec<ResponseEnvelope> {
        run_bytes(input.as_bytes()).await
    }

    async fn run_bytes(input: &[u8]) -> Vec<ResponseEnvelope> {
        let handler = HostHandler::new(ToolRegistry::new());
        let mut output: Vec<u8> = Vec::new();
        run_bridge(&handler, input, &mut output)
            .await
            .expect("bridge runs");
        String::from_utf8(output)
            .expect("utf8")
            .lines()
            .map(|l| serde_json::from_str(l).expect("response line"))
            .collect()
    }

    #[tokio::test]
    async fn answers_each_command_in_order() {
        let input = concat!(
            r#"{"v":1,"request_id":"a","command":"host.ping","payload":{}}"#,
            "\n\n",
            r#"{"v":1,"request_id":"b","command":"tool.list","payload":{}}"#,
            "\n",
        );
        let responses = run(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].request_id, "a");
        assert_eq!(responses[1].request_id, "b");
        assert!(responses.iter().all(|r| r.ok));
    }

    #[tokio::test]
    async fn garbage_line_gets_parse_error_and_loop_continues() {
        let input = concat!(
            "not json\n",
            r#"{"v":1,"request_id":"a","command":"host.ping"}"#,
            "\n",
        );
        let responses = run(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].request_id, "parse-error");
        assert!(!responses[0].ok);
        assert!(responses[1].ok);
    }

    #[tokio::test]
    async fn invalid_utf8_line_gets_parse_error_and_loop_continues() {
        let mut input: Vec<u8> = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(br#"{"v":1,"request_id":"a","command":"host.ping"}"#);
        input.push(b'\n');

        let responses = run_bytes(&input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].request_id, "parse-error");
        assert!(!responses[0].ok);
        assert!(responses[0].error.as_deref().unwrap_or_default().contains("UTF-8"));
        assert_eq!(responses[1].request_id, "a");
        assert!(responses[1].ok);
    }

    #[tokio::test]
    async fn final_line_without_newline_is_handled() {
        let responses = run(r#"{"v":1,"request_id":"a","command":"host.ping"}"#).await;
        assert_eq!(responses.len(), 1);
        assert!(responses[0].ok);
    }

    #[tokio::test]
    async fn unknown_command_is_parse_error() {
        let responses = run(r#"{"v":1,"request_id":"a","command":"runtime.start"}"#).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].request_id, "parse-error");
    }

    #[tokio::test]
    async fn stop_ends_the_loop() {
        let input = concat!(
            r#"{"v":1,"request_id":"a","command":"runtime.stop"}"#,
            "\n",
            r#"{"v":1,"request_id":"b","command":"host.ping"}"#,
            "\n",
        );
        let responses = run(input).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].payload["stopping"], true);
    }

    #[tokio::test]
    async fn empty_input_exits_cleanly() {
        assert!(run("").await.is_empty());
    }
}
