//! JADX MCP Server
//!
//! This binary runs an MCP server that exposes a running JADX decompiler
//! (through its HTTP plugin) over stdin/stdout or streamable HTTP.

use anyhow::Context;
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::http::{header::ORIGIN, Request, Response, StatusCode};
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use jadx_mcp::backend::{Endpoint, Params, Payload};
use jadx_mcp::config::{
    BackendConfig, CacheConfig, Config, DEFAULT_BACKEND_HOST, DEFAULT_BACKEND_PORT,
    DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_THRESHOLD, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS,
};
use jadx_mcp::{JadxMcpServer, JadxService};
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use rmcp::ServiceExt;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower_service::Service;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "jadx-mcp", version, about = "MCP server for the JADX decompiler")]
struct Cli {
    #[command(flatten)]
    settings: Settings,
    #[command(subcommand)]
    command: Option<Command>,
}

/// Backend and cache settings, fixed for the life of the process.
#[derive(Args)]
struct Settings {
    /// Host of the JADX plugin's HTTP server
    #[arg(long, global = true, env = "JADX_MCP_BACKEND_HOST", default_value = DEFAULT_BACKEND_HOST)]
    jadx_host: String,
    /// Port of the JADX plugin's HTTP server
    #[arg(long, global = true, env = "JADX_MCP_BACKEND_PORT", default_value_t = DEFAULT_BACKEND_PORT)]
    jadx_port: u16,
    /// Timeout for each backend request, in seconds
    #[arg(long, global = true, env = "JADX_MCP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
    /// Results with at least this many lines/records are cached and paged
    #[arg(long, global = true, env = "JADX_MCP_CACHE_THRESHOLD", default_value_t = DEFAULT_CACHE_THRESHOLD)]
    cache_threshold: usize,
    /// Maximum number of cached results before the oldest is evicted
    #[arg(long, global = true, env = "JADX_MCP_CACHE_CAPACITY", default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,
    /// Page size used when a caller does not give one
    #[arg(long, global = true, env = "JADX_MCP_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
}

impl Settings {
    fn into_config(self) -> anyhow::Result<Config> {
        let config = Config {
            backend: BackendConfig {
                host: self.jadx_host,
                port: self.jadx_port,
                timeout_secs: self.timeout_secs,
            },
            cache: CacheConfig {
                threshold: self.cache_threshold,
                max_entries: self.cache_capacity,
                default_page_size: self.page_size,
            },
        };
        Ok(config.validate()?)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run the MCP server over stdio (default)
    Serve,
    /// Run the MCP server over Streamable HTTP (SSE)
    ServeHttp(ServeHttpArgs),
    /// Check the backend and optionally dump one read endpoint's raw payload
    Probe(ProbeArgs),
}

#[derive(Args)]
struct ServeHttpArgs {
    /// Bind address (e.g., 127.0.0.1:8651)
    #[arg(long, default_value = "127.0.0.1:8651")]
    bind: String,
    /// SSE keep-alive interval in seconds (0 disables)
    #[arg(long, default_value_t = 15)]
    sse_keep_alive_secs: u64,
    /// Use stateless mode (POST only; no sessions)
    #[arg(long)]
    stateless: bool,
    /// Allowed Origin values (comma-separated). Defaults to localhost only.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "http://localhost,http://127.0.0.1"
    )]
    allow_origin: Vec<String>,
}

#[derive(Args)]
struct ProbeArgs {
    /// Read endpoint to call after the health check, e.g. get-class-source
    #[arg(long)]
    endpoint: Option<String>,
    /// Query parameter as key=value (repeatable), e.g. --param class_name=com.example.Main
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,
}

/// Rejects requests whose Origin header is not allow-listed.
#[derive(Clone)]
struct OriginCheckService<S> {
    inner: S,
    allowed_origins: Arc<HashSet<String>>,
}

impl<S> OriginCheckService<S> {
    fn new(inner: S, allowed_origins: Arc<HashSet<String>>) -> Self {
        Self {
            inner,
            allowed_origins,
        }
    }
}

impl<B, S> Service<Request<B>> for OriginCheckService<S>
where
    B: http_body::Body + Send + 'static,
    B::Error: std::fmt::Display,
    S: Service<
            Request<B>,
            Response = Response<BoxBody<Bytes, std::convert::Infallible>>,
            Error = std::convert::Infallible,
        > + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, std::convert::Infallible>>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let allowed_origins = self.allowed_origins.clone();
        let mut inner = self.inner.clone();
        Box::pin(async move {
            let origin = req.headers().get(ORIGIN).and_then(|v| v.to_str().ok());
            if let Some(origin) = origin.filter(|o| !allowed_origins.contains(*o)) {
                warn!(origin, "Rejected request from disallowed origin");
                let mut resp = Response::new(Full::new(Bytes::from("Forbidden")).boxed());
                *resp.status_mut() = StatusCode::FORBIDDEN;
                return Ok(resp);
            }
            inner.call(req).await
        })
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logging to stderr (stdout is used for MCP protocol)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jadx_mcp=info")))
        .init();

    let cli = Cli::parse();
    let config = cli.settings.into_config()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    runtime.block_on(run(cli.command.unwrap_or(Command::Serve), config))
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let service = JadxService::new(&config)?;
    match command {
        Command::Serve => run_server(service).await,
        Command::ServeHttp(args) => run_server_http(service, args).await,
        Command::Probe(args) => run_probe(service, args).await,
    }
}

async fn wait_for_shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigquit = signal(SignalKind::quit())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
            _ = sigquit.recv() => {},
            _ = tokio::signal::ctrl_c() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

/// Ping the backend once. A failure is logged, never fatal: JADX may be
/// started after this server.
async fn startup_health_check(service: &JadxService) {
    let backend = service.gateway().base_url().to_string();
    match service.health().await {
        Ok(status) => info!(%backend, %status, "JADX backend reachable"),
        Err(e) => warn!(
            %backend,
            error = %e,
            "JADX backend not reachable yet; tools will fail until the plugin is running"
        ),
    }
}

async fn run_server(service: JadxService) -> anyhow::Result<()> {
    info!("Starting JADX MCP Server (stdio mode)");
    startup_health_check(&service).await;

    let server = JadxMcpServer::new(service);
    let mut running = Some(server.serve(stdio()).await?);
    info!("MCP server listening on stdio");

    let shutdown_notify = Arc::new(Notify::new());
    let shutdown_signal = shutdown_notify.clone();
    tokio::spawn(async move {
        if wait_for_shutdown_signal().await.is_ok() {
            info!("Shutdown signal received");
            shutdown_signal.notify_one();
        } else {
            info!("Shutdown signal handler failed; server will continue running");
        }
    });

    loop {
        tokio::select! {
            _ = shutdown_notify.notified() => {
                if let Some(mut service) = running.take() {
                    let _ = service.close().await?;
                }
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                if running.as_ref().is_some_and(|s| s.is_transport_closed()) {
                    if let Some(service) = running.take() {
                        let _ = service.waiting().await?;
                    }
                    break;
                }
            }
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn run_server_http(service: JadxService, args: ServeHttpArgs) -> anyhow::Result<()> {
    info!("Starting JADX MCP Server (streamable HTTP mode)");

    let bind_addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address: {e}"))?;
    startup_health_check(&service).await;

    let cancel = tokio_util::sync::CancellationToken::new();
    let config = StreamableHttpServerConfig {
        sse_keep_alive: if args.sse_keep_alive_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(args.sse_keep_alive_secs))
        },
        sse_retry: None,
        stateful_mode: !args.stateless,
        cancellation_token: cancel.clone(),
    };

    // Every session shares one service, and with it one cache.
    let http_service = StreamableHttpService::new(
        move || Ok(JadxMcpServer::new(service.clone())),
        Arc::new(LocalSessionManager::default()),
        config,
    );
    let allowed_origins: HashSet<String> = args
        .allow_origin
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let http_service = OriginCheckService::new(http_service, Arc::new(allowed_origins));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind failed: {e}"))?;
    info!("MCP HTTP server listening on http://{bind_addr}");

    let cancel_for_shutdown = cancel.clone();
    tokio::spawn(async move {
        if wait_for_shutdown_signal().await.is_ok() {
            info!("Shutdown signal received");
            cancel_for_shutdown.cancel();
        }
    });

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("HTTP server shutting down");
                break;
            }
            res = listener.accept() => {
                let (stream, _) = res.map_err(|e| anyhow::anyhow!("accept failed: {e}"))?;
                let svc = http_service.clone();
                tokio::spawn(async move {
                    let conn = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(svc));
                    if let Err(err) = conn.await {
                        error!("http connection error: {err}");
                    }
                });
            }
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn run_probe(service: JadxService, args: ProbeArgs) -> anyhow::Result<()> {
    info!(backend = service.gateway().base_url(), "Starting JADX MCP Server (probe mode)");

    let health = service.health().await.context("health check failed")?;
    println!("{}", serde_json::to_string_pretty(&health)?);

    let Some(path) = args.endpoint else {
        return Ok(());
    };
    let endpoint =
        Endpoint::from_path(&path).ok_or_else(|| anyhow::anyhow!("unknown endpoint: {path}"))?;
    if endpoint.is_mutation() {
        anyhow::bail!("probe only issues reads; {endpoint} changes the project");
    }

    let mut params = Params::new();
    for pair in &args.params {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected KEY=VALUE, got '{pair}'"))?;
        params.set(key.trim(), value);
    }

    match service.gateway().fetch(endpoint, &params).await? {
        Payload::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Payload::Text(text) => println!("{text}"),
    }
    info!("Probe completed");
    Ok(())
}
