//! Shared MCP test helpers: a JSON-RPC session with the stdio server subprocess.

#![cfg(feature = "mcp")]
#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::Duration;

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Variables the server reads; cleared so the host environment never leaks in.
pub const CONFIG_VARS: [&str; 5] = [
    "SERPAPI_API_KEY",
    "DUFFEL_TOKEN",
    "SERPAPI_BASE_URL",
    "DUFFEL_BASE_URL",
    "DUFFEL_VERSION",
];

/// Credentials plus upstream base URLs pointing at mock servers.
pub fn server_env(serpapi_base_url: &str, duffel_base_url: &str) -> Vec<(&'static str, String)> {
    vec![
        ("SERPAPI_API_KEY", "serp-test-key".to_string()),
        ("DUFFEL_TOKEN", "duffel_test_token".to_string()),
        ("SERPAPI_BASE_URL", serpapi_base_url.to_string()),
        ("DUFFEL_BASE_URL", duffel_base_url.to_string()),
    ]
}

pub fn find_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_wayfare-flights-mcp"))
}

/// Server command with a clean config environment, run outside the crate so no `.env` is picked up.
pub fn server_command(envs: &[(&str, String)]) -> Command {
    let mut cmd = Command::new(find_binary());
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.current_dir(std::env::temp_dir()).kill_on_drop(true);
    cmd
}

pub async fn stream_stderr_to_console(mut stderr: tokio::process::ChildStderr) {
    let mut buf = [0u8; 4096];
    while let Ok(n) = stderr.read(&mut buf).await {
        if n == 0 {
            break;
        }
        eprint!("{}", String::from_utf8_lossy(&buf[..n]));
    }
}

pub struct McpSession {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

impl McpSession {
    pub async fn spawn(envs: &[(&str, String)]) -> Result<Self> {
        let mut child = server_command(envs)
            .arg("stdio")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn MCP server")?;

        let stdin = child.stdin.take().context("No stdin")?;
        let stdout = child.stdout.take().context("No stdout")?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(stream_stderr_to_console(stderr));
        }

        Ok(Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            next_id: 1,
        })
    }

    /// Spawns the server with credentials and completes the MCP handshake.
    pub async fn start(serpapi_base_url: &str, duffel_base_url: &str) -> Result<Self> {
        let mut session = Self::spawn(&server_env(serpapi_base_url, duffel_base_url)).await?;
        session.initialize().await?;
        Ok(session)
    }

    async fn send(&mut self, message: &Value) -> Result<()> {
        let mut line = message.to_string();
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Sends a request and returns the response carrying its id, skipping anything else.
    pub async fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await?;

        loop {
            let line = tokio::time::timeout(TIMEOUT, self.lines.next_line())
                .await
                .context(format!("Timed out waiting for {} response", method))??
                .context("Server closed stdout")?;
            tracing::debug!("<- {}", line);
            let Ok(message) = serde_json::from_str::<Value>(&line) else {
                continue;
            };
            if message["id"] == json!(id) {
                return Ok(message);
            }
        }
    }

    pub async fn notify(&mut self, method: &str) -> Result<()> {
        self.send(&json!({"jsonrpc": "2.0", "method": method})).await
    }

    pub async fn initialize(&mut self) -> Result<Value> {
        let response = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0"}
                }),
            )
            .await?;
        self.notify("notifications/initialized").await?;
        Ok(response)
    }

    /// `tools/call`, returning the `result` object.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        let response = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await?;
        response
            .get("result")
            .cloned()
            .context(format!("No result in response: {}", response))
    }

    /// Closes stdin and waits for the server to exit.
    pub async fn shutdown(self) -> Result<()> {
        let Self { mut child, stdin, .. } = self;
        drop(stdin);
        let status = tokio::time::timeout(TIMEOUT, child.wait())
            .await
            .context("Server did not exit after stdin closed")??;
        tracing::debug!("Server exited with {:?}", status);
        Ok(())
    }
}

/// Text of the first content item of a tool result.
pub fn tool_text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap_or_default()
}

pub fn is_tool_error(result: &Value) -> bool {
    result["isError"] == json!(true)
}
