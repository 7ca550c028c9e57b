use anyhow::Result;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

use toolbridge::config::{Config, LoggingConfig};
use toolbridge::mcp::{BridgeMcpServer, McpErrorCode, McpRequest};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(version)]
struct Cli {
    /// Configuration file path (searched in cwd and ~/.toolbridge when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Run in stdio mode for MCP hosts
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref(), cli.log_level.clone())?;

    let logging = config.logging.clone().unwrap_or_default();
    init_logging(&logging)?;

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    // stdio is the only transport; the flag is accepted for host configs
    // that pass it explicitly
    if !cli.stdio {
        debug!("Defaulting to stdio transport");
    }
    run_stdio_mode(config).await
}

/// Initialize logging to stderr; stdout carries the protocol
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match logging.format.to_lowercase().as_str() {
        "json" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        "pretty" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .init(),
        _ => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    Ok(())
}

/// Run the bridge in stdio mode: line-delimited JSON-RPC on stdin/stdout
async fn run_stdio_mode(config: Config) -> Result<()> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::sync::Mutex;

    let server = BridgeMcpServer::with_config(&config).await;

    // stdout is shared between the request loop and the notification task
    let stdin = tokio::io::stdin();
    let stdout = Arc::new(Mutex::new(tokio::io::stdout()));
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    // Forward outbound notifications (tools/list_changed) to the host
    let mut notification_receiver = server.notification_manager().subscribe();
    let stdout_clone = stdout.clone();
    tokio::spawn(async move {
        debug!("Started notification forwarding for stdio mode");
        while let Ok(notification) = notification_receiver.recv().await {
            let notification_json = json!({
                "jsonrpc": "2.0",
                "method": notification.method,
                "params": notification.params.unwrap_or_default()
            })
            .to_string();

            let mut stdout_guard = stdout_clone.lock().await;
            if let Err(e) = stdout_guard.write_all(notification_json.as_bytes()).await {
                debug!(
                    "Failed to write notification to stdout (host likely disconnected): {}",
                    e
                );
                break;
            }
            if let Err(e) = stdout_guard.write_all(b"\n").await {
                debug!("Failed to write notification newline: {}", e);
                break;
            }
            if let Err(e) = stdout_guard.flush().await {
                debug!("Failed to flush notification: {}", e);
                break;
            }
            debug!("Sent notification via stdio: {}", notification.method);
        }
        debug!("Notification forwarding ended for stdio mode");
    });

    info!("Tool bridge ready on stdio, waiting for JSON-RPC messages");

    loop {
        line.clear();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
            read = reader.read_line(&mut line) => match read {
                Ok(0) => {
                    info!("stdin closed, shutting down stdio mode");
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Some(response) = handle_stdio_message(&server, trimmed).await {
                        let mut stdout_guard = stdout.lock().await;
                        if let Err(e) = stdout_guard.write_all(response.as_bytes()).await {
                            error!("Failed to write response to stdout: {}", e);
                            break;
                        }
                        if let Err(e) = stdout_guard.write_all(b"\n").await {
                            error!("Failed to write newline to stdout: {}", e);
                            break;
                        }
                        if let Err(e) = stdout_guard.flush().await {
                            error!("Failed to flush stdout: {}", e);
                            break;
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }
    }

    server.shutdown();
    Ok(())
}

/// Handle a single JSON-RPC message; returns None for notifications
async fn handle_stdio_message(server: &BridgeMcpServer, message: &str) -> Option<String> {
    let request: McpRequest = match serde_json::from_str(message) {
        Ok(request) => request,
        Err(e) => {
            return Some(create_error_response(
                None,
                McpErrorCode::ParseError,
                &format!("Invalid JSON: {}", e),
            ));
        }
    };

    match server.handle_mcp_request(request).await {
        Ok(response) => response,
        Err(e) => {
            error!("Error handling stdio message: {}", e);
            Some(create_error_response(
                None,
                McpErrorCode::InternalError,
                &format!("Internal error: {}", e),
            ))
        }
    }
}

/// Create an error JSON-RPC response
fn create_error_response(id: Option<&serde_json::Value>, code: McpErrorCode, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code as i32,
            "message": message
        }
    })
    .to_string()
}
