use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use greetrpc_server::{CompressionMode, FaultConfig, Server, ServerConfig};

#[derive(Debug, Clone, ValueEnum)]
enum Compression {
    None,
    All,
    PerCall,
}

#[derive(Parser, Debug)]
#[command(name = "greetrpc-server")]
struct Args {
    /// Address to listen on; port 0 picks a free port.
    #[arg(long, default_value = "127.0.0.1:0")]
    listen: SocketAddr,

    /// Fraction of greeting calls declined with 503 (0.0 to 1.0).
    #[arg(long, default_value_t = 0.0)]
    unavailable_ratio: f32,

    /// Stall a random slice of calls per the built-in latency tiers.
    #[arg(long)]
    inject_latency: bool,

    /// Response compression scope: none | all | per-call.
    #[arg(long, value_enum, default_value_t = Compression::None)]
    compression: Compression,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if !(0.0..=1.0).contains(&args.unavailable_ratio) {
        return Err("--unavailable-ratio must be between 0.0 and 1.0".into());
    }

    let compression = match args.compression {
        Compression::None => CompressionMode::Disabled,
        Compression::All => CompressionMode::AllResponses,
        Compression::PerCall => CompressionMode::PerCall,
    };

    let config = ServerConfig {
        address: args.listen,
        faults: FaultConfig {
            unavailable_ratio: args.unavailable_ratio,
            inject_latency: args.inject_latency,
        },
        compression,
    };

    if args.unavailable_ratio > 0.0 {
        println!(
            "Responding as UNAVAILABLE to {:.0}% of requests",
            args.unavailable_ratio * 100.0
        );
    }

    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();

    // Print "Listening on <addr>" once the server signals it is bound.
    tokio::spawn(async move {
        if let Ok(addr) = ready_rx.await {
            println!("Listening on {}", addr);
        }
    });

    Server::new(config).run(ready_tx).await?;
    Ok(())
}
