use clap::Parser;
use client::{ClientModel, NetworkClient};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use shared::Color;
use std::time::Duration;
use tokio::time::interval;

/// Paints random tiles at a fixed pace; useful for load and demo runs
#[derive(Parser, Debug)]
#[command(author, version, about = "Random painting bot for the shared Place canvas")]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Name to log in with
    #[arg(short, long, default_value = "bot")]
    username: String,

    /// Milliseconds between paint requests
    #[arg(short, long, default_value_t = 250)]
    interval_ms: u64,

    /// Stop after this many requests
    #[arg(short, long)]
    count: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let addr = (args.host.as_str(), args.port);
    let mut client = NetworkClient::connect(addr, &args.username, ClientModel::new()).await?;

    let dim = client.board().map_or(0, |board| board.dim()) as i32;
    if dim == 0 {
        warn!("Server sent an empty board, nothing to paint");
        client.disconnect().await;
        return Ok(());
    }

    let mut receive = client.start_receive_loop()?;
    let mut rng = StdRng::from_entropy();
    let mut ticker = interval(Duration::from_millis(args.interval_ms.max(1)));
    let mut sent = 0u64;

    info!("Painting a {}x{} board as {}", dim, dim, client.username());

    while args.count.map_or(true, |count| sent < count) {
        tokio::select! {
            _ = ticker.tick() => {
                let row = rng.gen_range(0..dim);
                let col = rng.gen_range(0..dim);
                let color = Color::ALL.choose(&mut rng).copied().unwrap_or(Color::DEFAULT);
                client.paint(row, col, color).await?;
                sent += 1;
            }
            _ = &mut receive => {
                warn!("Server closed the connection");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping");
                break;
            }
        }
    }

    info!("Sent {} paint requests", sent);
    client.disconnect().await;
    Ok(())
}
