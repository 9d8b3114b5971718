use clap::Parser;
use std::io::Write;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use greetrpc_client::{Client, ClientConfig};
use greetrpc_common::{ServiceConfig, WireFormat};
use greetrpc_loadgen::driver::{self, DriverOptions};
use greetrpc_loadgen::report::PercentileReport;
use greetrpc_loadgen::scenario::Scenario;
use greetrpc_loadgen::server::ServerProcess;

#[derive(Parser)]
#[command(name = "greetrpc-load", about = "GreetRPC load and latency harness")]
struct Args {
    /// Scenario: hello | retry | hedging | no-hedging
    #[arg(long, default_value = "hedging")]
    scenario: String,

    /// Number of calls to issue; each scenario has its own default
    #[arg(long)]
    calls: Option<usize>,

    /// Worker pool size
    #[arg(long, default_value_t = 16)]
    concurrency: usize,

    /// Per-call deadline (milliseconds)
    #[arg(long, default_value_t = 30_000)]
    call_deadline_ms: u64,

    /// Bound on the join phase once all calls are dispatched (seconds)
    #[arg(long, default_value_t = 100)]
    batch_timeout_secs: u64,

    /// Wire format: binary | json
    #[arg(long, default_value = "binary")]
    wire: String,

    /// Path to a JSON service config overriding the stock policies
    #[arg(long)]
    service_config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let scenario = Scenario::from_name(&args.scenario).unwrap_or_else(|| {
        eprintln!(
            "Unknown scenario {:?}. Valid values: hello, retry, hedging, no-hedging",
            args.scenario
        );
        process::exit(3);
    });

    let wire_format = WireFormat::from_name(&args.wire).unwrap_or_else(|| {
        eprintln!("Unknown wire format {:?}. Valid values: binary, json", args.wire);
        process::exit(3);
    });

    let service_config = match &args.service_config {
        None => ServiceConfig::default(),
        Some(path) => {
            let json = std::fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Failed to read service config {}: {e}", path.display());
                process::exit(3);
            });
            ServiceConfig::from_json(&json).unwrap_or_else(|e| {
                eprintln!("{e}");
                process::exit(3);
            })
        }
    };

    let server = ServerProcess::build_and_spawn(&scenario.server_args()).unwrap_or_else(|e| {
        eprintln!("Failed to start server: {e}");
        process::exit(3);
    });

    println!("Server ready on {}  ({} scenario)", server.addr, scenario.as_name());

    let client = Arc::new(Client::new(ClientConfig {
        target: server.addr.to_string(),
        wire_format,
        call_deadline: Duration::from_millis(args.call_deadline_ms),
        service_config,
    }));

    let call_count = args.calls.unwrap_or_else(|| scenario.default_call_count());
    let opts = DriverOptions {
        call_count,
        concurrency: args.concurrency,
        call_deadline: Duration::from_millis(args.call_deadline_ms),
        batch_timeout: Duration::from_secs(args.batch_timeout_secs),
    };

    print!("Running {} calls at concurrency {} ", call_count, args.concurrency);
    std::io::stdout().flush().ok();

    let dot_handle = tokio::spawn(async {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await; // consume the immediate first tick
        loop {
            interval.tick().await;
            print!(".");
            std::io::stdout().flush().ok();
        }
    });

    let result = match scenario {
        Scenario::Hello | Scenario::NoHedging => {
            driver::run(opts, move |i| {
                let client = client.clone();
                async move { client.greet(&format!("user{i}")).await.map(|_| ()) }
            })
            .await
        }
        Scenario::Retry => {
            driver::run(opts, move |i| {
                let client = client.clone();
                async move { client.greet_with_retry(&format!("user{i}")).await.map(|_| ()) }
            })
            .await
        }
        Scenario::Hedging => {
            driver::run(opts, move |i| {
                let client = client.clone();
                async move { client.greet_hedged(&format!("user{i}")).await.map(|_| ()) }
            })
            .await
        }
    };

    dot_handle.abort();
    println!();

    drop(server);

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Run aborted: {e}");
            process::exit(1);
        }
    };

    print_summary(scenario, &report);
}

fn print_summary(scenario: Scenario, report: &PercentileReport) {
    println!();
    println!(
        "Total RPCs sent: {}. Total RPCs failed: {}",
        report.total_count, report.failed_count
    );
    println!("[{}]", scenario.as_label());
    println!("========================");
    println!("50% latency: {}ms", report.p50.as_millis());
    println!("90% latency: {}ms", report.p90.as_millis());
    println!("95% latency: {}ms", report.p95.as_millis());
    println!("99% latency: {}ms", report.p99.as_millis());
    println!("99.9% latency: {}ms", report.p999.as_millis());
    println!("Max latency: {}ms", report.max.as_millis());
    println!("========================");
}
