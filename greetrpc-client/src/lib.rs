use std::time::Duration;
use tokio::task::JoinSet;
use uuid::Uuid;

use greetrpc_common::{
    wire, ErrorResponse, GreetError, HelloRequest, Result, ServiceConfig, WireFormat,
    MAX_NAME_SIZE,
};

/// Greeter client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Target address (`host:port`); all requests go to this node.
    pub target: String,
    /// Wire encoding used for requests; replies arrive in the same format.
    pub wire_format: WireFormat,
    /// Per-attempt deadline. Hedged and retried calls apply it to each
    /// attempt individually.
    pub call_deadline: Duration,
    /// Retry and hedging policies executed by this client.
    pub service_config: ServiceConfig,
}

impl ClientConfig {
    /// Config with the default binary framing, a 30s per-attempt deadline,
    /// and stock policies.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            wire_format: WireFormat::Binary,
            call_deadline: Duration::from_secs(30),
            service_config: ServiceConfig::default(),
        }
    }
}

/// Greeter client
pub struct Client {
    pub config: ClientConfig,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Self {
        Self { config, http_client: reqwest::Client::new() }
    }

    /// Override the target node for all subsequent requests.
    /// Pass a bare `host:port` address.
    pub fn set_target(&mut self, addr: &str) {
        self.config.target = addr.to_string();
    }

    /// Build the URL for the greeting call against the current target.
    pub fn build_greet_url(&self) -> String {
        format!("http://{}/greet", self.config.target)
    }

    /// Send one greeting call and return the server's message.
    pub async fn greet(&self, name: &str) -> Result<String> {
        greet_attempt(
            self.http_client.clone(),
            self.config.clone(),
            name.to_string(),
            Uuid::new_v4().to_string(),
        )
        .await
    }

    /// Greet under the configured retry policy: transient failures are
    /// retried with exponential backoff until an attempt succeeds or
    /// `max_attempts` is reached; the last error is returned then.
    /// All attempts share one `X-Request-Id`.
    pub async fn greet_with_retry(&self, name: &str) -> Result<String> {
        let policy = self.config.service_config.retry.clone();
        let request_id = Uuid::new_v4().to_string();
        let mut backoff_ms = policy.initial_backoff_ms;
        let mut attempt = 0;

        loop {
            let result = greet_attempt(
                self.http_client.clone(),
                self.config.clone(),
                name.to_string(),
                request_id.clone(),
            )
            .await;

            match result {
                Ok(message) => return Ok(message),
                Err(e) => {
                    attempt += 1;
                    if attempt >= policy.max_attempts || !policy.retryable(&e) {
                        return Err(e);
                    }
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = policy.next_backoff_ms(backoff_ms);
                }
            }
        }
    }

    /// Greet under the configured hedging policy: up to `max_attempts`
    /// copies of the call are staged `hedging_delay` apart and the first
    /// success wins; in-flight copies are dropped once a winner lands. A
    /// failed copy releases the next hedge immediately rather than waiting
    /// out the delay. All copies share one `X-Request-Id`.
    pub async fn greet_hedged(&self, name: &str) -> Result<String> {
        let policy = self.config.service_config.hedging.clone();
        let max_attempts = policy.max_attempts.max(1);
        let delay = Duration::from_millis(policy.hedging_delay_ms);
        let request_id = Uuid::new_v4().to_string();

        let mut attempts: JoinSet<Result<String>> = JoinSet::new();
        let mut launched: u32 = 0;
        let mut last_err: Option<GreetError> = None;
        let mut next_launch = tokio::time::Instant::now();

        loop {
            if launched < max_attempts {
                tokio::select! {
                    _ = tokio::time::sleep_until(next_launch) => {
                        attempts.spawn(greet_attempt(
                            self.http_client.clone(),
                            self.config.clone(),
                            name.to_string(),
                            request_id.clone(),
                        ));
                        launched += 1;
                        next_launch = tokio::time::Instant::now() + delay;
                    }
                    Some(joined) = attempts.join_next() => {
                        match flatten_attempt(joined) {
                            Ok(message) => return Ok(message),
                            Err(e) => {
                                last_err = Some(e);
                                next_launch = tokio::time::Instant::now();
                            }
                        }
                    }
                }
            } else {
                match attempts.join_next().await {
                    Some(joined) => match flatten_attempt(joined) {
                        Ok(message) => return Ok(message),
                        Err(e) => last_err = Some(e),
                    },
                    None => {
                        return Err(last_err.unwrap_or_else(|| {
                            GreetError::Network("no hedged attempts launched".to_string())
                        }))
                    }
                }
            }
        }
    }
}

fn flatten_attempt(
    joined: std::result::Result<Result<String>, tokio::task::JoinError>,
) -> Result<String> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(GreetError::Network(format!("hedged attempt aborted: {e}"))),
    }
}

/// One wire-level greeting attempt. Takes owned arguments so hedged copies
/// can run as independent tasks.
async fn greet_attempt(
    http_client: reqwest::Client,
    config: ClientConfig,
    name: String,
    request_id: String,
) -> Result<String> {
    if name.len() > MAX_NAME_SIZE {
        return Err(GreetError::NameTooLarge(MAX_NAME_SIZE));
    }

    let url = format!("http://{}/greet", config.target);
    let body = wire::encode_request(config.wire_format, &HelloRequest { name })?;
    let deadline_ms = config.call_deadline.as_millis() as u64;

    let response = http_client
        .post(&url)
        .header("Content-Type", config.wire_format.content_type())
        .header("X-Request-Id", request_id)
        .timeout(config.call_deadline)
        .body(body)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                GreetError::Timeout(deadline_ms)
            } else {
                GreetError::Network(e.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(parse_error_response(status, response).await);
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| GreetError::Network(e.to_string()))?;

    let reply = wire::decode_reply(config.wire_format, &bytes)?;
    Ok(reply.message)
}

async fn parse_error_response(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> GreetError {
    let error_msg = response
        .json::<ErrorResponse>()
        .await
        .map(|r| r.error)
        .unwrap_or_else(|_| format!("Server returned status: {}", status));

    if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
        return GreetError::Unavailable(error_msg);
    }

    GreetError::Http(status.as_u16(), error_msg)
}
