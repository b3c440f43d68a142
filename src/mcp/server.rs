//! MCP server — line-delimited JSON-RPC over stdin/stdout.
//!
//! One request per line, one response per line. Notifications get no
//! reply. Logs must never go to stdout; it belongs to the protocol.

use anyhow::Result;
use serde_json::{json, Value};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use super::protocol::{methods, RpcError, RpcRequest, RpcResponse, MCP_PROTOCOL_VERSION};
use super::tools::{call_tool, list_tools};
use super::types::{InitializeResult, ServerInfo};
use crate::config::SaverConfig;

/// Name reported to clients in `serverInfo`.
pub const SERVER_NAME: &str = "text-saver";

/// A message may be this many times `max_text_bytes` (JSON escaping can
/// grow a control character to six bytes), plus room for the envelope.
const FRAME_SIZE_FACTOR: usize = 6;
const FRAME_ENVELOPE_BYTES: usize = 64 * 1024;

/// One newline-delimited message read from the client.
enum Frame {
    Line(Vec<u8>),
    /// Discarded; holds the number of bytes seen.
    TooLong(usize),
    Eof,
}

#[derive(Clone)]
pub struct McpServer {
    config: SaverConfig,
}

impl McpServer {
    pub fn new(config: SaverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SaverConfig {
        &self.config
    }

    /// Largest message accepted before it is dropped unread.
    pub fn frame_limit(&self) -> usize {
        self.config
            .max_text_bytes
            .saturating_mul(FRAME_SIZE_FACTOR)
            .saturating_add(FRAME_ENVELOPE_BYTES)
    }

    /// Serve stdin/stdout until EOF or `shutdown` resolves.
    pub async fn run_stdio(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout, shutdown).await
    }

    /// Serve any line-oriented reader/writer pair.
    ///
    /// Only I/O errors on the transport end the loop; bad messages get an
    /// error reply. Requests run on the blocking pool so a large write
    /// never stalls the shutdown signal.
    pub async fn serve<R, W>(
        &self,
        mut reader: R,
        mut writer: W,
        shutdown: impl Future<Output = ()>,
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let limit = self.frame_limit();
        tokio::pin!(shutdown);

        loop {
            let frame = tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                frame = read_frame(&mut reader, limit) => frame?,
            };

            let response = match frame {
                Frame::Eof => {
                    debug!("stdin closed");
                    break;
                }
                Frame::TooLong(size) => {
                    warn!(size, limit, "message too large, discarded");
                    Some(RpcResponse::error(
                        None,
                        RpcError::invalid_request(format!(
                            "message of {} bytes exceeds the {} byte limit",
                            size, limit
                        )),
                    ))
                }
                Frame::Line(bytes) => {
                    let server = self.clone();
                    let task = tokio::task::spawn_blocking(move || server.handle_bytes(&bytes));
                    tokio::select! {
                        _ = &mut shutdown => {
                            info!("shutdown requested while a request was in flight");
                            break;
                        }
                        joined = task => match joined {
                            Ok(response) => response,
                            Err(e) => {
                                error!(error = %e, "request handler failed");
                                Some(RpcResponse::error(None, RpcError::new(-32603, "Internal error")))
                            }
                        },
                    }
                }
            };

            if let Some(response) = response {
                let mut json = serde_json::to_string(&response)?;
                json.push('\n');
                writer.write_all(json.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle one raw message that may not be UTF-8.
    pub fn handle_bytes(&self, bytes: &[u8]) -> Option<RpcResponse> {
        match std::str::from_utf8(bytes) {
            Ok(line) => self.handle_line(line),
            Err(e) => {
                warn!(error = %e, "message is not valid UTF-8");
                Some(RpcResponse::error(None, RpcError::parse_error(e)))
            }
        }
    }

    /// Handle one raw line. `None` means nothing should be written back.
    pub fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparsable message");
                return Some(RpcResponse::error(None, RpcError::parse_error(e)));
            }
        };

        let request: RpcRequest = match serde_json::from_value(value.clone()) {
            Ok(r) => r,
            Err(e) => {
                let id = value.get("id").cloned().and_then(|v| serde_json::from_value(v).ok());
                return Some(RpcResponse::error(id, RpcError::invalid_request(e)));
            }
        };

        debug!(method = %request.method, id = ?request.id, "received request");
        self.process_request(request)
    }

    /// Process a request and return a response (none for notifications).
    pub fn process_request(&self, request: RpcRequest) -> Option<RpcResponse> {
        let outcome = match request.method.as_str() {
            methods::INITIALIZE => Ok(self.initialize(request.params.as_ref())),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => Ok(json!({ "tools": list_tools() })),
            methods::TOOLS_CALL => self.tools_call(request.params.as_ref()),
            methods::INITIALIZED => {
                info!("client initialized");
                return None;
            }
            other => Err(RpcError::method_not_found(other)),
        };

        if request.is_notification() {
            if let Err(e) = outcome {
                debug!(error = %e.message, "dropping error for notification");
            }
            return None;
        }

        Some(match outcome {
            Ok(result) => RpcResponse::success(request.id, result),
            Err(error) => RpcResponse::error(request.id, error),
        })
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let client = params
            .and_then(|p| p.get("clientInfo"))
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(client, "initialize");

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: json!({ "tools": {} }),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    fn tools_call(&self, params: Option<&Value>) -> std::result::Result<Value, RpcError> {
        let params = params.ok_or_else(|| RpcError::invalid_params("missing params"))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("missing tool name"))?;
        let empty = json!({});
        let arguments = params.get("arguments").unwrap_or(&empty);

        info!(tool = name, "tool call");
        let result = call_tool(&self.config, name, arguments);
        serde_json::to_value(result).map_err(|e| RpcError::new(-32603, e.to_string()))
    }
}

/// Read up to the next newline, keeping at most `limit` bytes in memory.
async fn read_frame<R>(reader: &mut R, limit: usize) -> std::io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut seen = 0usize;

    loop {
        let (consumed, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(match seen {
                    0 => Frame::Eof,
                    n if n > limit => Frame::TooLong(n),
                    _ => Frame::Line(buf),
                });
            }

            let (chunk, consumed, done) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (&available[..i], i + 1, true),
                None => (available, available.len(), false),
            };
            seen = seen.saturating_add(chunk.len());
            if seen <= limit {
                buf.extend_from_slice(chunk);
            } else if !buf.is_empty() {
                buf = Vec::new();
            }
            (consumed, done)
        };
        reader.consume(consumed);

        if done {
            return Ok(if seen > limit { Frame::TooLong(seen) } else { Frame::Line(buf) });
        }
    }
}

/// Resolves on SIGINT, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_in(dir: &tempfile::TempDir) -> McpServer {
        McpServer::new(SaverConfig::with_root(dir.path()))
    }

    #[test]
    fn test_initialize() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(&dir);
        let res = server
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"clientInfo":{"name":"t"}}}"#)
            .unwrap();
        let result = res.result.unwrap();
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "text-saver");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[test]
    fn test_notifications_get_no_reply() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(&dir);
        assert!(server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .is_none());
        assert!(server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/unknown"}"#)
            .is_none());
        assert!(server.handle_line("   ").is_none());
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = server_in(&dir).handle_line("{not json").unwrap();
        assert_eq!(res.error.unwrap().code, -32700);
        assert!(res.id.is_none());
    }

    #[test]
    fn test_unknown_method() {
        let dir = tempfile::tempdir().unwrap();
        let res = server_in(&dir)
            .handle_line(r#"{"jsonrpc":"2.0","id":"x","method":"resources/list"}"#)
            .unwrap();
        assert_eq!(res.error.unwrap().code, -32601);
    }

    #[test]
    fn test_tools_call_requires_name() {
        let dir = tempfile::tempdir().unwrap();
        let res = server_in(&dir)
            .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{}}"#)
            .unwrap();
        assert_eq!(res.error.unwrap().code, -32602);
    }

    #[test]
    fn test_tools_call_saves() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(&dir);
        let res = server
            .handle_line(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"save_text","arguments":{"text":"data","filename":"../../etc/passwd"}}}"#,
            )
            .unwrap();
        let result = res.result.unwrap();
        assert_eq!(result["isError"], false);
        assert!(dir.path().join("passwd.txt").is_file());
    }

    #[tokio::test]
    async fn test_serve_over_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(&dir);

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let mut output = Vec::new();
        server
            .serve(input.as_bytes(), &mut output, std::future::pending())
            .await
            .unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["result"]["tools"][0]["name"], "save_text");
    }

    async fn serve_bytes(server: &McpServer, input: &[u8]) -> Vec<Value> {
        let mut output = Vec::new();
        server
            .serve(input, &mut output, std::future::pending())
            .await
            .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_serving() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(&dir);

        let mut input = Vec::new();
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n");
        input.extend_from_slice(b"\xff\xfe garbage\n");
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\n");

        let replies = serve_bytes(&server, &input).await;
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["error"]["code"], -32700);
        assert!(replies[1]["id"].is_null());
        assert_eq!(replies[2]["id"], 2);
    }

    #[tokio::test]
    async fn test_oversized_line_is_rejected_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SaverConfig::with_root(dir.path());
        config.max_text_bytes = 16;
        let server = McpServer::new(config);

        let mut input = vec![b'a'; server.frame_limit() + 1];
        input.push(b'\n');
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"ping\"}\n");

        let replies = serve_bytes(&server, &input).await;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["error"]["code"], -32600);
        assert!(replies[0]["error"]["message"]
            .as_str()
            .unwrap()
            .contains("exceeds"));
        assert_eq!(replies[1]["id"], 5);
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SaverConfig::with_root(dir.path());
        config.max_text_bytes = 16;
        let server = McpServer::new(config);

        let ping = br#"{"jsonrpc":"2.0","id":6,"method":"ping"}"#;
        let mut input = ping.to_vec();
        input.resize(server.frame_limit(), b' ');
        input.push(b'\n');

        let replies = serve_bytes(&server, &input).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["id"], 6);
    }

    #[tokio::test]
    async fn test_serve_saves_through_tools_call() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(&dir);

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"save_text","arguments":{"text":"async","filename":"a"}}}"#,
            "\n",
        );
        let replies = serve_bytes(&server, input.as_bytes()).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0]["result"]["isError"], false);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "async"
        );
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let server = server_in(&dir);

        let (_client, server_end) = tokio::io::duplex(64);
        let (read_half, write_half) = tokio::io::split(server_end);
        server
            .serve(BufReader::new(read_half), write_half, async {})
            .await
            .unwrap();
    }
}
