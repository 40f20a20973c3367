use clap::Parser;
use server::network::RelayServer;
use server::registry::SessionRegistry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Main-method of the application.
/// Parses command-line arguments, builds the session registry and runs the
/// relay server until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8080")]
        port: u16,
        /// Per-connection outbound queue capacity
        #[clap(long, default_value = "64")]
        queue_capacity: usize,
    }

    env_logger::init();
    let args = Args::parse();

    // Exactly one registry per process, owned here and injected into the
    // accept loop.
    let registry = Arc::new(RwLock::new(SessionRegistry::new()));

    let address = format!("{}:{}", args.host, args.port);
    let relay = RelayServer::bind(&address, registry, args.queue_capacity).await?;

    tokio::select! {
        result = relay.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
