use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use greetrpc_client::{Client, ClientConfig};
use greetrpc_common::{
    GreetError, HedgingPolicy, RetryPolicy, WireFormat, MAX_NAME_SIZE,
};
use greetrpc_server::{CompressionMode, FaultConfig, Server, ServerConfig};

const SERVER_READY_TIMEOUT: Duration = Duration::from_secs(60);

async fn start_server(faults: FaultConfig, compression: CompressionMode) -> String {
    let (ready_tx, ready_rx) = oneshot::channel();

    let server = Server::new(ServerConfig {
        address: "127.0.0.1:0".parse().unwrap(),
        faults,
        compression,
    });

    tokio::spawn(async move {
        server.run(ready_tx).await.expect("server failed");
    });

    let addr = timeout(SERVER_READY_TIMEOUT, ready_rx)
        .await
        .expect("server did not start within 60 seconds")
        .expect("server ready signal dropped");

    addr.to_string()
}

async fn start_plain_server() -> String {
    start_server(FaultConfig::default(), CompressionMode::Disabled).await
}

fn client_for(target: &str) -> Client {
    Client::new(ClientConfig {
        call_deadline: Duration::from_secs(5),
        ..ClientConfig::new(target)
    })
}

#[tokio::test]
async fn test_greet_round_trip_binary() {
    let target = start_plain_server().await;
    let client = client_for(&target);

    let message = client.greet("world").await.expect("greet failed");
    assert_eq!(message, "hello world");
}

#[tokio::test]
async fn test_greet_round_trip_json() {
    let target = start_plain_server().await;
    let client = Client::new(ClientConfig {
        wire_format: WireFormat::Json,
        call_deadline: Duration::from_secs(5),
        ..ClientConfig::new(target)
    });

    let message = client.greet("world").await.expect("greet failed");
    assert_eq!(message, "hello world");
}

#[tokio::test]
async fn test_server_rejects_oversized_name() {
    // Bypass the client's local check to prove the server enforces the bound.
    let target = start_plain_server().await;
    let name = "x".repeat(MAX_NAME_SIZE + 1);

    let response = reqwest::Client::new()
        .post(format!("http://{target}/greet"))
        .header("Content-Type", "application/octet-stream")
        .body(name)
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_server_rejects_unknown_content_type() {
    let target = start_plain_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://{target}/greet"))
        .header("Content-Type", "text/plain")
        .body("world")
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_server_rejects_malformed_json_body() {
    let target = start_plain_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://{target}/greet"))
        .header("Content-Type", "application/json")
        .body("{broken")
        .send()
        .await
        .expect("request failed");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_healthz_answers() {
    let target = start_plain_server().await;

    let response = reqwest::get(format!("http://{target}/healthz"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

// --- Fault injection + client policies ---

#[tokio::test]
async fn test_always_unavailable_server_maps_to_unavailable_error() {
    let faults = FaultConfig { unavailable_ratio: 1.0, inject_latency: false };
    let target = start_server(faults, CompressionMode::Disabled).await;
    let client = client_for(&target);

    let result = client.greet("world").await;
    assert!(matches!(result, Err(GreetError::Unavailable(_))));
}

#[tokio::test]
async fn test_retry_exhausts_against_always_unavailable_server() {
    let faults = FaultConfig { unavailable_ratio: 1.0, inject_latency: false };
    let target = start_server(faults, CompressionMode::Disabled).await;

    let mut config = ClientConfig::new(target);
    config.call_deadline = Duration::from_secs(5);
    config.service_config.retry = RetryPolicy {
        max_attempts: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 4,
        ..RetryPolicy::default()
    };
    let client = Client::new(config);

    let result = client.greet_with_retry("world").await;
    assert!(matches!(result, Err(GreetError::Unavailable(_))));
}

#[tokio::test]
async fn test_retry_succeeds_against_healthy_server() {
    let target = start_plain_server().await;
    let client = client_for(&target);

    let message = client.greet_with_retry("world").await.expect("greet failed");
    assert_eq!(message, "hello world");
}

#[tokio::test]
async fn test_hedged_call_against_healthy_server() {
    let target = start_plain_server().await;

    let mut config = ClientConfig::new(target);
    config.call_deadline = Duration::from_secs(5);
    config.service_config.hedging = HedgingPolicy { max_attempts: 3, hedging_delay_ms: 100 };
    let client = Client::new(config);

    let message = client.greet_hedged("world").await.expect("greet failed");
    assert_eq!(message, "hello world");
}

// --- Compression ---

/// Raw client that does not decompress, so Content-Encoding is observable.
fn observing_client() -> reqwest::Client {
    reqwest::Client::builder().no_gzip().build().unwrap()
}

/// Greet with a name long enough that the reply clears the compression
/// layer's minimum-size threshold.
async fn greet_raw(target: &str) -> reqwest::Response {
    let name = "n".repeat(256);
    observing_client()
        .post(format!("http://{target}/greet"))
        .header("Content-Type", "application/octet-stream")
        .header("Accept-Encoding", "gzip")
        .body(name)
        .send()
        .await
        .expect("request failed")
}

#[tokio::test]
async fn test_whole_server_compression_negotiates_gzip() {
    let target = start_server(FaultConfig::default(), CompressionMode::AllResponses).await;
    let response = greet_raw(&target).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers().get("content-encoding").map(|v| v.to_str().unwrap()),
        Some("gzip")
    );
}

#[tokio::test]
async fn test_per_call_compression_negotiates_gzip_on_greet() {
    let target = start_server(FaultConfig::default(), CompressionMode::PerCall).await;
    let response = greet_raw(&target).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers().get("content-encoding").map(|v| v.to_str().unwrap()),
        Some("gzip")
    );
}

#[tokio::test]
async fn test_disabled_compression_sends_identity() {
    let target = start_plain_server().await;
    let response = greet_raw(&target).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().get("content-encoding").is_none());
}

#[tokio::test]
async fn test_compressed_reply_reads_transparently_through_the_client() {
    // The stub client asks for gzip and reqwest decompresses it; the reply
    // must come out identical to the uncompressed path.
    let target = start_server(FaultConfig::default(), CompressionMode::AllResponses).await;
    let client = client_for(&target);

    let name = "n".repeat(256);
    let message = client.greet(&name).await.expect("greet failed");
    assert_eq!(message, format!("hello {name}"));
}
