//! Stdio framing in front of rmcp.
//!
//! rmcp types `tools/call` arguments as an optional JSON object. A frame whose
//! `arguments` is any other JSON value fails to deserialize and ends the
//! session, so each inbound line is inspected first and such arguments are
//! wrapped under `RAW_ARGUMENTS_KEY`. The dispatcher turns the wrapped value
//! into an ordinary validation error for that one call.

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

/// Key holding non-object `tools/call` arguments after rewriting.
pub const RAW_ARGUMENTS_KEY: &str = "$arguments";

const PIPE_CAPACITY: usize = 64 * 1024;

/// Rewrite one inbound frame if its `tools/call` arguments are not an object.
///
/// Returns `None` when the line should pass through untouched.
pub fn normalize_frame(line: &str) -> Option<String> {
    let mut frame: Value = serde_json::from_str(line).ok()?;
    if frame.get("method").and_then(Value::as_str) != Some("tools/call") {
        return None;
    }
    let arguments = frame.get_mut("params")?.get_mut("arguments")?;
    if arguments.is_object() || arguments.is_null() {
        return None;
    }
    let raw = arguments.take();
    *arguments = json!({ (RAW_ARGUMENTS_KEY): raw });
    serde_json::to_string(&frame).ok()
}

/// Stdin, line-normalized, as an in-process pipe rmcp can read from.
pub fn normalized_stdin() -> DuplexStream {
    let (reader, writer) = tokio::io::duplex(PIPE_CAPACITY);
    tokio::spawn(async move {
        if let Err(e) = pump(tokio::io::stdin(), writer).await {
            tracing::warn!(error = %e, "stopped reading stdin");
        }
    });
    reader
}

async fn pump<R, W>(input: R, mut output: W) -> std::io::Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines.next_line().await? {
        let line = match normalize_frame(&line) {
            Some(rewritten) => {
                tracing::debug!("wrapped non-object tool arguments");
                rewritten
            }
            None => line,
        };
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }
    output.shutdown().await
}
