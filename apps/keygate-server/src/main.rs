//! KeyGate Server - signed CRUD gateway.
//!
//! Serves one JSON endpoint per configured path. Every request must carry an
//! `X-API-Client` header and an `X-API-Request-Sign` HMAC signature; reads and
//! writes are scoped to the customer of the signing client.
//!
//! # Usage
//!
//! ```text
//! KEYGATE_FIXTURES=./fixtures.json GATEWAY_LISTEN=127.0.0.1:8080 keygate-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `KEYGATE_FIXTURES` | *(unset)* | JSON file seeding credentials, schemas, endpoints and entities |
//! | `KEYGATE_SIGNATURE_ALGORITHM` | `hmac-sha1` | `hmac-sha1` or `hmac-sha256` |
//! | `KEYGATE_SIGNATURE_WINDOW_MINUTES` | `1` | Preceding minutes whose signatures are accepted (at most 60) |
//! | `KEYGATE_SKIP_SIGNATURE_VALIDATION` | `false` | Skip the signature comparison |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod fixtures;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use keygate_auth::{AuthConfig, RequestValidator};
use keygate_core::{KeyGateConfig, LogFormat};
use keygate_http::{Dispatcher, GatewayService};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::fixtures::{Fixtures, Seeded};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }

    Ok(())
}

/// Load the stores from the fixture file, or start empty.
fn load_seed(config: &KeyGateConfig) -> Result<Seeded> {
    match config.fixtures.as_deref() {
        Some(path) => {
            let seeded = Fixtures::load(Path::new(path))?.seed()?;
            info!(
                path,
                clients = seeded.credentials.len(),
                kinds = seeded.schemas.len(),
                endpoints = seeded.endpoints.len(),
                entities = seeded.store.len(),
                "loaded fixtures",
            );
            Ok(seeded)
        }
        None => {
            warn!("KEYGATE_FIXTURES is not set; starting with no clients or endpoints");
            Fixtures::default().seed()
        }
    }
}

/// Build the gateway service from seeded stores and auth settings.
fn build_service(seeded: Seeded, auth: AuthConfig) -> GatewayService {
    let validator = RequestValidator::new(Arc::new(seeded.credentials), auth);
    let dispatcher = Dispatcher::new(
        validator,
        seeded.endpoints,
        seeded.schemas,
        Arc::new(seeded.store),
    );
    GatewayService::new(dispatcher)
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: GatewayService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Probe the health endpoint of a running server.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = KeyGateConfig::from_env();

    // Handle --health-check flag for container health probes.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level, config.log_format)?;

    let auth = AuthConfig::from_env();
    if auth.skip_signature_validation {
        warn!("signature validation is disabled; do not use this setting in production");
    }
    info!(
        algorithm = auth.algorithm.as_str(),
        window_minutes = auth.window_minutes,
        "configured request signing",
    );

    let seeded = load_seed(&config)?;
    let service = build_service(seeded, auth);

    let listen_addr = &config.gateway_listen;
    let addr: SocketAddr = listen_addr
        .parse()
        .with_context(|| format!("invalid bind address: {listen_addr}"))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, version = VERSION, "starting KeyGate server");

    serve(listener, service).await
}
