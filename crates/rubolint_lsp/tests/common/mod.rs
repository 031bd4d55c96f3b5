#![allow(dead_code)]

use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::mpsc;
use tower_lsp::{LspService, Server};

use rubolint_lsp::Backend;

pub async fn send_msg<W: AsyncWriteExt + Unpin>(writer: &mut W, msg: &str) {
    let content = format!("Content-Length: {}\r\n\r\n{}", msg.len(), msg);
    writer.write_all(content.as_bytes()).await.unwrap();
    writer.flush().await.unwrap();
}

pub async fn recv_msg<R: AsyncReadExt + Unpin>(reader: &mut R) -> Option<String> {
    let mut buffer = Vec::new();
    let mut content_length = 0;

    loop {
        let byte = reader.read_u8().await.ok()?;
        buffer.push(byte);
        if buffer.ends_with(b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buffer);
            for line in headers.lines() {
                if line.to_lowercase().starts_with("content-length:") {
                    if let Some((_, value)) = line.split_once(':') {
                        content_length = value.trim().parse().unwrap_or_else(|e| {
                            panic!("Failed to parse Content-Length: {e}, header: {line}")
                        });
                    }
                }
            }
            break;
        }
    }

    if content_length == 0 {
        return None;
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await.ok()?;

    Some(String::from_utf8(body).unwrap())
}

/// A client talking to an in-process server over duplex pipes.
pub struct TestClient {
    writer: DuplexStream,
    incoming: mpsc::UnboundedReceiver<Value>,
    /// Received but not yet matched.
    pending: Vec<Value>,
    next_id: u64,
}

impl TestClient {
    pub fn start() -> Self {
        let (client_read, server_write) = tokio::io::duplex(64 * 1024);
        let (server_read, client_write) = tokio::io::duplex(64 * 1024);

        let (service, socket) = LspService::new(Backend::new);
        tokio::spawn(async move {
            Server::new(server_read, server_write, socket)
                .serve(service)
                .await;
        });

        let (tx, incoming) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut reader = BufReader::new(client_read);
            while let Some(msg) = recv_msg(&mut reader).await {
                let value: Value = serde_json::from_str(&msg).unwrap();
                if tx.send(value).is_err() {
                    break;
                }
            }
        });

        Self {
            writer: client_write,
            incoming,
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Sends a request and returns its id.
    pub async fn request(&mut self, method: &str, params: Value) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let msg = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        send_msg(&mut self.writer, &msg.to_string()).await;
        id
    }

    pub async fn notify(&mut self, method: &str, params: Value) {
        let msg = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        send_msg(&mut self.writer, &msg.to_string()).await;
    }

    /// Waits for the first incoming message matching `pred`. Other messages
    /// are kept for later calls.
    pub async fn wait_for(&mut self, pred: impl Fn(&Value) -> bool) -> Option<Value> {
        if let Some(idx) = self.pending.iter().position(&pred) {
            return Some(self.pending.remove(idx));
        }

        let deadline = tokio::time::sleep(Duration::from_secs(10));
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                msg = self.incoming.recv() => match msg {
                    Some(msg) if pred(&msg) => return Some(msg),
                    Some(msg) => self.pending.push(msg),
                    None => return None,
                },
                _ = &mut deadline => return None,
            }
        }
    }

    /// Returns every message received so far that matches `pred`, without
    /// waiting and without consuming them.
    pub fn received(&mut self, pred: impl Fn(&Value) -> bool) -> Vec<Value> {
        while let Ok(msg) = self.incoming.try_recv() {
            self.pending.push(msg);
        }
        self.pending.iter().filter(|msg| pred(msg)).cloned().collect()
    }

    pub async fn response(&mut self, id: u64) -> Option<Value> {
        self.wait_for(|msg| msg["id"] == id && msg.get("method").is_none())
            .await
    }

    pub async fn notification(&mut self, method: &str) -> Option<Value> {
        self.wait_for(|msg| msg["method"] == method).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recv_msg_success() {
        let payload = r#"{"jsonrpc":"2.0","method":"abc","params":{}}"#;
        let data = format!("Content-Length: {}\r\n\r\n{}", payload.len(), payload);
        let mut cursor = std::io::Cursor::new(data.into_bytes());

        let result = recv_msg(&mut cursor).await;
        assert_eq!(result.unwrap(), payload);
    }

    #[tokio::test]
    #[should_panic(expected = "Failed to parse Content-Length")]
    async fn test_recv_msg_parse_error() {
        let data = "Content-Length: invalid\r\n\r\n{}";
        let mut cursor = std::io::Cursor::new(data.as_bytes());
        let _ = recv_msg(&mut cursor).await;
    }
}
