use clap::Parser;
use log::{error, info};
use server::config::{DEFAULT_DIM, DEFAULT_HOST, DEFAULT_PORT, MAX_DIM};
use server::{Server, ServerConfig};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Authoritative server for the shared Place canvas")]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Side length of the square board
    #[arg(short, long, default_value_t = DEFAULT_DIM as u16,
          value_parser = clap::value_parser!(u16).range(1..=MAX_DIM as i64))]
    dim: u16,

    /// Minimum milliseconds between sessions from one IP address (0 disables)
    #[arg(short, long, default_value_t = 500)]
    flood_window_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        dim: args.dim as usize,
        flood_window: Duration::from_millis(args.flood_window_ms),
    };

    let server = match Server::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start server: {}", e);
            return Err(e.into());
        }
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
