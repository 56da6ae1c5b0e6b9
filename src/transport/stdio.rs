//! Standard I/O transport implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{JsonRpcMessage, McpMessage, MessageHandler};

/// Outcome of reading one line from the input stream
#[derive(Debug)]
enum Incoming {
    Message(McpMessage),
    /// Blank line
    Skip,
    /// Line that could not be decoded; answered with a parse error
    Invalid(String),
    Eof,
}

/// Standard I/O transport for local CLI integration with MCP clients
pub struct StdioTransport {
    writer: Arc<Mutex<BufWriter<tokio::io::Stdout>>>,
    shutdown_signal: Arc<AtomicBool>,
}

impl StdioTransport {
    /// Create a new stdio transport instance
    pub fn new() -> Self {
        Self {
            writer: Arc::new(Mutex::new(BufWriter::new(tokio::io::stdout()))),
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_signal.load(Ordering::SeqCst)
    }

    fn request_shutdown(&self) {
        self.shutdown_signal.store(true, Ordering::SeqCst);
    }

    /// Read and decode one newline-delimited JSON-RPC message
    async fn read_message<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Incoming> {
        let mut line = String::new();
        let read = reader.read_line(&mut line).await.context("Failed to read from stdin")?;
        if read == 0 {
            debug!("EOF received on stdin");
            return Ok(Incoming::Eof);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Incoming::Skip);
        }
        debug!("Received line: {}", trimmed);

        let decoded = serde_json::from_str::<JsonRpcMessage>(trimmed)
            .map_err(anyhow::Error::new)
            .and_then(McpMessage::from_jsonrpc);
        match decoded {
            Ok(message) => Ok(Incoming::Message(message)),
            Err(e) => {
                warn!("Failed to decode JSON-RPC message: {:#}", e);
                Ok(Incoming::Invalid(format!("Parse error: {:#}", e)))
            }
        }
    }

    /// Serialize a message as one line and flush
    async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, message: &JsonRpcMessage) -> Result<()> {
        let json_str = serde_json::to_string(message).context("Failed to serialize message to JSON")?;
        debug!("Sending message: {}", json_str);

        writer
            .write_all(json_str.as_bytes())
            .await
            .context("Failed to write message to stdout")?;
        writer.write_all(b"\n").await.context("Failed to write newline to stdout")?;
        writer.flush().await.context("Failed to flush stdout")?;
        Ok(())
    }

    /// Message loop over arbitrary streams; returns at EOF or on shutdown
    async fn serve<R, W>(
        &self,
        reader: &mut R,
        writer: &Mutex<W>,
        handler: &(dyn MessageHandler + Send + Sync),
    ) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        while !self.is_shutdown_requested() {
            let reply = match Self::read_message(reader).await? {
                Incoming::Eof => break,
                Incoming::Skip => continue,
                Incoming::Invalid(message) => Some(JsonRpcMessage::parse_error(message)),
                Incoming::Message(message) => match handler.handle_message(message).await {
                    Ok(response) => response.map(|response| response.to_jsonrpc()),
                    Err(e) => {
                        error!("Handler error: {}", e);
                        None
                    }
                },
            };

            if let Some(reply) = reply {
                let mut writer = writer.lock().await;
                if let Err(e) = Self::write_line(&mut *writer, &reply).await {
                    error!("Failed to send response: {}", e);
                }
            }
        }

        info!("Message processing loop ended");
        Ok(())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::Transport for StdioTransport {
    /// Start the stdio transport and begin message processing
    async fn start(&self, handler: Box<dyn MessageHandler + Send + Sync>) -> Result<()> {
        info!("Starting stdio transport for MCP communication");
        self.shutdown_signal.store(false, Ordering::SeqCst);

        let mut reader = BufReader::new(tokio::io::stdin());
        self.serve(&mut reader, &self.writer, handler.as_ref()).await
    }

    /// Shutdown the stdio transport
    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down stdio transport");
        self.request_shutdown();

        if let Ok(mut writer) = self.writer.try_lock() {
            if let Err(e) = writer.flush().await {
                warn!("Failed to flush output during shutdown: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    struct EchoHandler;

    #[async_trait]
    impl MessageHandler for EchoHandler {
        async fn handle_message(&self, message: McpMessage) -> Result<Option<McpMessage>> {
            Ok(message.id().cloned().map(|id| McpMessage::result(id, json!({ "echo": true }))))
        }
    }

    async fn run(input: &str) -> Vec<Value> {
        let transport = StdioTransport::new();
        let mut reader = input.as_bytes();
        let writer = Mutex::new(Vec::new());
        transport.serve(&mut reader, &writer, &EchoHandler).await.unwrap();

        let output = writer.into_inner();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_shutdown_signal() {
        let transport = StdioTransport::new();
        assert!(!transport.is_shutdown_requested());
        transport.request_shutdown();
        assert!(transport.is_shutdown_requested());
    }

    #[tokio::test]
    async fn answers_requests_until_eof() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "{\"jsonrpc\":\"2.0\",\"id\":\"two\",\"method\":\"tools/list\"}\n",
        );
        let responses = run(input).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], "two");
    }

    #[tokio::test]
    async fn invalid_json_gets_parse_error() {
        let responses = run("not json\n{\"jsonrpc\":\"2.0\",\"id\":5,\"method\":\"ping\"}\n").await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[1]["id"], 5);
    }
}
