use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;

use greetrpc_common::{wire, ErrorResponse, HelloReply, WireFormat, MAX_NAME_SIZE};

pub mod config;
use config::{injected_delay_ms, MAX_BODY_SIZE};

/// Abstraction over randomness for testability.
pub trait Dice: Send + Sync {
    /// Uniform draw in `[0, 1)`; drives the unavailability decision.
    fn roll_unit(&self) -> f32;
    /// Uniform draw in `0..100`; drives latency tier selection.
    fn roll_percent(&self) -> u32;
}

/// Production dice backed by the thread-local RNG.
pub struct ThreadRngDice;

impl Dice for ThreadRngDice {
    fn roll_unit(&self) -> f32 {
        rand::thread_rng().gen()
    }

    fn roll_percent(&self) -> u32 {
        rand::thread_rng().gen_range(0..100)
    }
}

/// Fault behaviors injected into the greeting handler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaultConfig {
    /// Fraction of calls declined with 503 before any work is done.
    pub unavailable_ratio: f32,
    /// Stall a random slice of calls per the latency tiers.
    pub inject_latency: bool,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self { unavailable_ratio: 0.0, inject_latency: false }
    }
}

/// Response compression scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    /// No compression layer installed.
    Disabled,
    /// Compression negotiated for every route on the server.
    AllResponses,
    /// Compression negotiated only for the greeting call.
    PerCall,
}

#[derive(Clone)]
pub struct AppState {
    pub faults: FaultConfig,
    pub dice: Arc<dyn Dice>,
    /// Calls seen by the greeting handler, including ones declined as
    /// unavailable.
    pub requests_served: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(faults: FaultConfig, dice: Arc<dyn Dice>) -> Self {
        Self { faults, dice, requests_served: Arc::new(AtomicU64::new(0)) }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub faults: FaultConfig,
    pub compression: CompressionMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".parse().expect("valid default address"),
            faults: FaultConfig::default(),
            compression: CompressionMode::Disabled,
        }
    }
}

/// Greeting server
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server's configured address
    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    /// Create the application router with the given state.
    ///
    /// In `PerCall` mode the compression layer wraps only the `/greet` route;
    /// in `AllResponses` mode it wraps the whole router, `/healthz` included.
    pub fn create_router(state: AppState, compression: CompressionMode) -> Router {
        let mut greet = Router::new().route("/greet", post(handle_greet));
        if compression == CompressionMode::PerCall {
            greet = greet.layer(CompressionLayer::new());
        }

        let mut app = greet
            .route("/healthz", get(handle_healthz))
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
            .with_state(state);
        if compression == CompressionMode::AllResponses {
            app = app.layer(CompressionLayer::new());
        }
        app
    }

    /// Run the server, signalling `ready_tx` with the bound address once accepting connections
    pub async fn run(
        self,
        ready_tx: tokio::sync::oneshot::Sender<SocketAddr>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let state = AppState::new(self.config.faults, Arc::new(ThreadRngDice));
        let app = Self::create_router(state, self.config.compression);
        let listener = tokio::net::TcpListener::bind(self.config.address).await?;
        let local_addr = listener.local_addr()?;
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

/// Handler for POST /greet — decodes the request per its `Content-Type`,
/// applies the configured fault behaviors, and replies `hello <name>` in the
/// same wire format the caller used.
pub async fn handle_greet(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.requests_served.fetch_add(1, Ordering::Relaxed);

    if state.faults.inject_latency {
        let delay_ms = injected_delay_ms(state.dice.roll_percent());
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    if state.faults.unavailable_ratio > 0.0
        && state.dice.roll_unit() < state.faults.unavailable_ratio
    {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "greeter temporarily unavailable");
    }

    // Missing Content-Type falls back to the default binary framing.
    let format = match headers.get(header::CONTENT_TYPE) {
        None => WireFormat::Binary,
        Some(value) => {
            let parsed = value.to_str().ok().and_then(WireFormat::from_content_type);
            match parsed {
                Some(format) => format,
                None => {
                    return error_response(
                        StatusCode::UNSUPPORTED_MEDIA_TYPE,
                        "No marshaller registered for the request Content-Type",
                    )
                }
            }
        }
    };

    let request = match wire::decode_request(format, &body) {
        Ok(request) => request,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    if request.name.len() > MAX_NAME_SIZE {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Name exceeds maximum size of {} bytes", MAX_NAME_SIZE),
        );
    }

    let reply = HelloReply { message: format!("hello {}", request.name) };
    let body = match wire::encode_reply(format, &reply) {
        Ok(body) => body,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    ([(header::CONTENT_TYPE, format.content_type())], body).into_response()
}

/// Handler for GET /healthz — liveness probe, not counted as a served call.
pub async fn handle_healthz() -> &'static str {
    "ok"
}
